//! Maps event records onto block and transaction entities.
//!
//! Every recognized `(kind, label)` pair resolves to one [`Handler`], and every
//! handler writes the fields of exactly one entity (`tx_commit` additionally
//! propagates its commit to the listed transactions).

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::model::{EventRecord, Height, StreamRole, TxId};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Event,
    Time,
}

impl EventKind {
    pub fn parse(k: &str) -> Option<Self> {
        match k {
            "event" => Some(EventKind::Event),
            "time" => Some(EventKind::Time),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    StartSendTx,
    EndSendTx,
    TxBegin,
    TxCommit,
    TxOutdated,
    TxConflict,
    BlkRecvTx,
    ProposeEnd,
    VerifyBlock,
    Mining,
    ExecTime,
}

impl Handler {
    pub fn lookup(kind: EventKind, label: &str) -> Option<Handler> {
        use EventKind::*;
        use Handler::*;
        let handler = match (kind, label) {
            (Event, "start-send-tx") => StartSendTx,
            (Event, "end-send-tx") => EndSendTx,
            (Event, "tx_begin") => TxBegin,
            (Event, "tx_commit") => TxCommit,
            (Event, "tx_outdated") => TxOutdated,
            (Event, "tx_conflict") => TxConflict,
            (Event, "blk_recv_tx") => BlkRecvTx,
            (Event, "propose_end") => ProposeEnd,
            (Time, "verify_block") => VerifyBlock,
            (Time, "mining") => Mining,
            (Time, "exec_time") => ExecTime,
            _ => return None,
        };
        Some(handler)
    }

    /// Handlers that only the client stream may drive. Nodes log some of the
    /// same labels (e.g. `tx_commit` on storage nodes).
    pub fn client_only(self) -> bool {
        matches!(
            self,
            Handler::StartSendTx
                | Handler::EndSendTx
                | Handler::TxBegin
                | Handler::TxCommit
                | Handler::TxOutdated
                | Handler::TxConflict
        )
    }
}

/// What happened to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Known label, but not accepted from this stream's role.
    Ignored,
    /// Unknown kind or label.
    Unrecognized,
    /// `exec_time` from a stream that is not a storage node.
    MissingStorageId,
}

pub fn apply_record(session: &mut Session, role: StreamRole, rec: &EventRecord) -> Result<Outcome> {
    let handler = match EventKind::parse(&rec.k).and_then(|kind| Handler::lookup(kind, &rec.l)) {
        Some(h) => h,
        None => return Ok(Outcome::Unrecognized),
    };
    if handler.client_only() && !role.is_client() {
        return Ok(Outcome::Ignored);
    }

    match handler {
        Handler::StartSendTx => {
            session.window.start = Some(event_ts(rec)?);
        }
        Handler::EndSendTx => {
            session.window.end = Some(event_ts(rec)?);
            session.window.reported_rate = rec.v.get("rate").and_then(Value::as_f64);
        }
        Handler::TxBegin => {
            let ts = event_ts(rec)?;
            session.txs.get_or_create(&tx_id_field(&rec.v)?).send_ts = Some(ts);
        }
        Handler::TxCommit => {
            let ts = event_ts(rec)?;
            let height = height_field(&rec.v)?;
            let tx_ids = tx_ids_field(&rec.v)?;
            for id in &tx_ids {
                let tx = session.txs.get_or_create(id);
                tx.block_height = Some(height);
                tx.commit_ts = Some(ts);
            }
            let blk = session.blocks.get_or_create(&height);
            blk.commit_ts = Some(ts);
            blk.tx_list = tx_ids;
        }
        Handler::TxOutdated => {
            session.txs.get_or_create(&tx_id_field(&rec.v)?).outdated = true;
        }
        Handler::TxConflict => {
            session.txs.get_or_create(&tx_id_field(&rec.v)?).conflicted = true;
        }
        Handler::BlkRecvTx => {
            let ts = event_ts(rec)?;
            session.txs.get_or_create(&tx_id_field(&rec.v)?).propose_recv_ts = Some(ts);
        }
        Handler::ProposeEnd => {
            let ts = event_ts(rec)?;
            session.blocks.get_or_create(&height_field(&rec.v)?).propose_end_ts = Some(ts);
        }
        Handler::VerifyBlock => {
            let t = time_value(rec)?;
            session.blocks.get_or_create(&height_field(&rec.v)?).verify_time = Some(t);
        }
        Handler::Mining => {
            let t = time_value(rec)?;
            session.blocks.get_or_create(&height_field(&rec.v)?).mining_time = Some(t);
        }
        Handler::ExecTime => {
            let storage_id = match role.storage_id() {
                Some(id) => id,
                None => return Ok(Outcome::MissingStorageId),
            };
            let t = time_value(rec)?;
            let tx = session.txs.get_or_create(&tx_id_field(&rec.v)?);
            tx.exec_time = Some(t);
            tx.exec_storage_node = Some(storage_id);
        }
    }
    Ok(Outcome::Applied)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .with_context(|| format!("invalid timestamp '{}'", s))
}

fn event_ts(rec: &EventRecord) -> Result<DateTime<Utc>> {
    let raw = rec
        .ts
        .as_ref()
        .ok_or_else(|| anyhow!("'{}' event has no ts", rec.l))?;
    let raw = raw
        .as_str()
        .ok_or_else(|| anyhow!("'{}' event has a non-string ts: {}", rec.l, raw))?;
    parse_timestamp(raw)
}

fn time_value(rec: &EventRecord) -> Result<f64> {
    let raw = rec
        .t_in_us
        .as_ref()
        .ok_or_else(|| anyhow!("'{}' time record has no t_in_us", rec.l))?;
    raw.as_f64()
        .ok_or_else(|| anyhow!("'{}' time record has a non-numeric t_in_us: {}", rec.l, raw))
}

fn id_from_value(v: &Value) -> Option<TxId> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn tx_id_field(v: &Value) -> Result<TxId> {
    v.get("tx_id")
        .and_then(id_from_value)
        .ok_or_else(|| anyhow!("payload has no tx_id"))
}

fn height_field(v: &Value) -> Result<Height> {
    v.get("height")
        .and_then(Value::as_u64)
        .ok_or_else(|| anyhow!("payload has no numeric height"))
}

fn tx_ids_field(v: &Value) -> Result<Vec<TxId>> {
    let items = v
        .get("tx_ids")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("payload has no tx_ids array"))?;
    items
        .iter()
        .map(|item| id_from_value(item).ok_or_else(|| anyhow!("invalid entry in tx_ids: {}", item)))
        .collect()
}
