/// Percentiles reported for every series, alongside the mean.
pub const REPORTED_PERCENTILES: [f64; 3] = [0.5, 0.9, 0.95];

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Transaction series, in report order.
pub const TX_SERIES: [&str; 5] = [
    "tx_latency",
    "tx_exec_time",
    "tx_propose_time",
    "tx_mining_time",
    "tx_verify_time",
];

/// Block series, in report order.
pub const BLOCK_SERIES: [&str; 3] = ["blk_tx_num", "blk_mining_time", "blk_verify_time"];

pub fn storage_node_key(id: u32) -> String {
    format!("storage_node_{}_exec_tx_count", id)
}
