use chrono::{DateTime, Utc};

use crate::model::{Block, Height, Registry, Transaction, TxId};

/// Send window reported by the client stream.
#[derive(Debug, Clone, Default)]
pub struct SendWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Rate the client reported with `end-send-tx`, in tx/s.
    pub reported_rate: Option<f64>,
    /// Transactions sent inside the window, counted before pruning.
    pub sent_count: Option<u64>,
}

/// All state of one analysis run. Written by the reconstructor, pruned by the
/// window filter, then only read by the aggregator.
#[derive(Debug, Default)]
pub struct Session {
    pub blocks: Registry<Height, Block>,
    pub txs: Registry<TxId, Transaction>,
    pub window: SendWindow,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }
}
