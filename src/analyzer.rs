use std::collections::BTreeMap;

use crate::config::{storage_node_key, BLOCK_SERIES, TX_SERIES};
use crate::model::{Block, Height};
use crate::report::{Metric, ResultMap};
use crate::session::Session;
use crate::stats::{statistics_from_vec, time_difference_in_us};
use crate::window::{count_sent, Window};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SuccessCounts {
    pub total: u64,
    pub committed: u64,
    pub conflicted: u64,
    pub outdated: u64,
}

/// Per-transaction samples over committed transactions, in `TX_SERIES` order.
#[derive(Debug, Default)]
pub struct TxSeries {
    pub latency: Vec<f64>,
    pub exec_time: Vec<f64>,
    pub propose_time: Vec<f64>,
    pub mining_time: Vec<f64>,
    pub verify_time: Vec<f64>,
}

/// Per-block samples, in `BLOCK_SERIES` order.
#[derive(Debug, Default)]
pub struct BlockSeries {
    pub tx_num: Vec<f64>,
    pub mining_time: Vec<f64>,
    pub verify_time: Vec<f64>,
}

fn ratio(n: u64, total: u64) -> f64 {
    match total {
        0 => f64::NAN,
        _ => n as f64 / total as f64,
    }
}

pub fn count_success(session: &Session) -> SuccessCounts {
    let mut counts = SuccessCounts::default();
    for tx in session.txs.values() {
        counts.total += 1;
        if tx.is_committed() {
            counts.committed += 1;
        }
        if tx.conflicted {
            counts.conflicted += 1;
        }
        if tx.outdated {
            counts.outdated += 1;
        }
    }
    counts
}

pub fn collect_tx_series(session: &Session) -> TxSeries {
    let blocks = &session.blocks;
    let mut series = TxSeries::default();
    for tx in session.txs.values().filter(|tx| tx.is_committed()) {
        if let Some(latency) = tx.latency() {
            series.latency.push(latency);
        }
        series.exec_time.push(tx.exec_time.unwrap_or(0.0));
        if let Some(t) = tx.propose_time(blocks) {
            series.propose_time.push(t);
        }
        series.mining_time.push(tx.blk_mining_time(blocks).unwrap_or(0.0));
        if let Some(t) = tx.blk_verify_time(blocks) {
            series.verify_time.push(t);
        }
    }
    series
}

pub fn collect_block_series(session: &Session) -> BlockSeries {
    let mut series = BlockSeries::default();
    for blk in session.blocks.values() {
        series.tx_num.push(blk.tx_list.len() as f64);
        series.mining_time.push(blk.mining_time.unwrap_or(0.0));
        if let Some(t) = blk.verify_time {
            series.verify_time.push(t);
        }
    }
    series
}

/// Committed transactions per second between the first and last kept block.
/// The first block's transactions are left out of the numerator.
pub fn throughput(session: &Session) -> f64 {
    let mut ordered: Vec<(&Height, &Block)> = session
        .blocks
        .iter()
        .filter(|(_, blk)| blk.commit_ts.is_some())
        .collect();
    ordered.sort_by_key(|(h, blk)| (blk.commit_ts, **h));

    let (first, last) = match (ordered.first(), ordered.last()) {
        (Some(f), Some(l)) if ordered.len() >= 2 => (f.1, l.1),
        _ => return f64::NAN,
    };
    let span_us = match (first.commit_ts, last.commit_ts) {
        (Some(a), Some(b)) => time_difference_in_us(a, b),
        _ => return f64::NAN,
    };
    if span_us <= 0.0 {
        return f64::NAN;
    }

    let total: usize = ordered.iter().map(|(_, blk)| blk.tx_list.len()).sum();
    (total - first.tx_list.len()) as f64 / (span_us / 1_000_000.0)
}

/// Executed transactions per storage node, ids ascending.
pub fn storage_node_counts(session: &Session) -> BTreeMap<u32, u64> {
    let mut counts = BTreeMap::new();
    for tx in session.txs.values() {
        if let (Some(_), Some(node)) = (tx.exec_time, tx.exec_storage_node) {
            *counts.entry(node).or_insert(0) += 1;
        }
    }
    counts
}

fn send_rate(session: &Session, window: &Window) -> f64 {
    if let Some(rate) = session.window.reported_rate {
        return rate;
    }
    let secs = time_difference_in_us(window.start, window.end) / 1_000_000.0;
    if secs <= 0.0 {
        return f64::NAN;
    }
    let sent = session
        .window
        .sent_count
        .unwrap_or_else(|| count_sent(session, window));
    sent as f64 / secs
}

fn insert_series(result: &mut ResultMap, name: &str, values: Vec<f64>, as_metric: fn(f64) -> Metric) {
    let stats = statistics_from_vec(values);
    for (suffix, v) in stats.entries() {
        result.insert(format!("{}_{}", name, suffix), as_metric(v));
    }
}

/// Builds the result mapping from a session the window filter has already
/// pruned.
pub fn aggregate(session: &Session, window: &Window) -> ResultMap {
    let mut result = ResultMap::new();

    let counts = count_success(session);
    result.insert("total_tx", Metric::Count(counts.total));
    result.insert("committed_tx", Metric::Count(counts.committed));
    result.insert("conflicted_tx", Metric::Count(counts.conflicted));
    result.insert("outdated_tx", Metric::Count(counts.outdated));
    result.insert(
        "committed_tx_percentage",
        Metric::Ratio(ratio(counts.committed, counts.total)),
    );
    result.insert(
        "conflicted_tx_percentage",
        Metric::Ratio(ratio(counts.conflicted, counts.total)),
    );
    result.insert(
        "outdated_tx_percentage",
        Metric::Ratio(ratio(counts.outdated, counts.total)),
    );

    let tx = collect_tx_series(session);
    let tx_values = [
        tx.latency,
        tx.exec_time,
        tx.propose_time,
        tx.mining_time,
        tx.verify_time,
    ];
    for (name, values) in TX_SERIES.iter().zip(tx_values) {
        insert_series(&mut result, name, values, Metric::Duration);
    }

    result.insert("total_blocks", Metric::Count(session.blocks.len() as u64));
    let blk = collect_block_series(session);
    let [tx_num_name, mining_name, verify_name] = BLOCK_SERIES;
    insert_series(&mut result, tx_num_name, blk.tx_num, Metric::Number);
    insert_series(&mut result, mining_name, blk.mining_time, Metric::Duration);
    insert_series(&mut result, verify_name, blk.verify_time, Metric::Duration);
    result.insert("throughput", Metric::Rate(throughput(session)));

    result.insert(
        "window_duration",
        Metric::Duration(time_difference_in_us(window.start, window.end)),
    );
    result.insert("tx_send_rate", Metric::Rate(send_rate(session, window)));

    for (node, n) in storage_node_counts(session) {
        result.insert(storage_node_key(node), Metric::Count(n));
    }
    result
}
