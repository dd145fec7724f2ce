use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::stats::time_difference_in_us;

pub type TxId = String;
pub type Height = u64;

/// One line of an event log, as written by the node's event recorder.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    pub k: String,
    pub l: String,
    /// Typed by the handler that reads it, so records nobody handles never
    /// fail on an odd field type.
    #[serde(default)]
    pub ts: Option<serde_json::Value>,
    #[serde(default)]
    pub t_in_us: Option<serde_json::Value>,
    #[serde(default)]
    pub v: serde_json::Value,
}

/// Which process wrote a stream. Storage nodes carry their sequential id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRole {
    Client,
    Peer,
    Storage(u32),
}

impl StreamRole {
    pub fn is_client(self) -> bool {
        matches!(self, StreamRole::Client)
    }

    pub fn storage_id(self) -> Option<u32> {
        match self {
            StreamRole::Storage(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub commit_ts: Option<DateTime<Utc>>,
    pub tx_list: Vec<TxId>,
    pub mining_time: Option<f64>,
    pub verify_time: Option<f64>,
    pub propose_end_ts: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct Transaction {
    pub block_height: Option<Height>,
    pub send_ts: Option<DateTime<Utc>>,
    pub propose_recv_ts: Option<DateTime<Utc>>,
    pub commit_ts: Option<DateTime<Utc>>,
    pub exec_time: Option<f64>,
    pub exec_storage_node: Option<u32>,
    pub outdated: bool,
    pub conflicted: bool,
}

// Derived fields are recomputed on every call; entities are frozen once
// reconstruction ends, so there is nothing to invalidate.
impl Transaction {
    pub fn is_committed(&self) -> bool {
        self.commit_ts.is_some()
    }

    /// Committed, outdated or conflicted.
    pub fn is_resolved(&self) -> bool {
        self.is_committed() || self.outdated || self.conflicted
    }

    /// End-to-end latency in microseconds.
    pub fn latency(&self) -> Option<f64> {
        Some(time_difference_in_us(self.send_ts?, self.commit_ts?))
    }

    /// Time from reception by the proposer to the end of its block's
    /// proposal phase, in microseconds.
    pub fn propose_time(&self, blocks: &Registry<Height, Block>) -> Option<f64> {
        let block = blocks.get(&self.block_height?)?;
        Some(time_difference_in_us(
            self.propose_recv_ts?,
            block.propose_end_ts?,
        ))
    }

    pub fn blk_mining_time(&self, blocks: &Registry<Height, Block>) -> Option<f64> {
        blocks.get(&self.block_height?)?.mining_time
    }

    pub fn blk_verify_time(&self, blocks: &Registry<Height, Block>) -> Option<f64> {
        blocks.get(&self.block_height?)?.verify_time
    }
}

/// Keyed entity store. `get_or_create` is the only way an entity comes into
/// existence.
#[derive(Debug)]
pub struct Registry<K, V> {
    entries: HashMap<K, V>,
}

impl<K, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Default> Registry<K, V> {
    pub fn get_or_create<Q>(&mut self, key: &Q) -> &mut V
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ToOwned<Owned = K> + ?Sized,
    {
        self.entries
            .entry(key.to_owned())
            .or_insert_with(V::default)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn retain(&mut self, f: impl FnMut(&K, &mut V) -> bool) {
        self.entries.retain(f);
    }
}
