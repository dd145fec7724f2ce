use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::model::Transaction;
use crate::session::Session;

/// Measurement window `(start, end)`, both bounds exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start < ts && ts < self.end
    }
}

pub fn resolve_window(session: &Session) -> Result<Window> {
    let start = session
        .window
        .start
        .ok_or_else(|| anyhow!("insufficient data: client stream has no start-send-tx event"))?;
    let end = session
        .window
        .end
        .ok_or_else(|| anyhow!("insufficient data: client stream has no end-send-tx event"))?;
    Ok(Window { start, end })
}

fn sent_inside(tx: &Transaction, window: &Window) -> bool {
    tx.send_ts.map_or(false, |ts| window.contains(ts))
}

/// Transactions whose `send_ts` lies inside the window, resolved or not.
pub fn count_sent(session: &Session, window: &Window) -> u64 {
    session
        .txs
        .values()
        .filter(|tx| sent_inside(tx, window))
        .count() as u64
}

/// Records the sent count, then drops blocks committed outside the window and
/// transactions that were sent outside it, committed after it, or never
/// resolved.
pub fn apply_window(session: &mut Session) -> Result<Window> {
    let window = resolve_window(session)?;
    let (blocks_before, txs_before) = (session.blocks.len(), session.txs.len());
    session.window.sent_count = Some(count_sent(session, &window));

    session
        .blocks
        .retain(|_, blk| blk.commit_ts.map_or(false, |ts| window.contains(ts)));
    session.txs.retain(|_, tx| {
        let committed_in_time = tx.commit_ts.map_or(true, |ts| ts < window.end);
        sent_inside(tx, &window) && committed_in_time && tx.is_resolved()
    });

    info!(
        blocks_kept = session.blocks.len(),
        blocks_dropped = blocks_before - session.blocks.len(),
        txs_kept = session.txs.len(),
        txs_dropped = txs_before - session.txs.len(),
        "window applied"
    );
    Ok(window)
}
