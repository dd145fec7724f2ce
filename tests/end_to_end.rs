use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use stat_txlog_rs::analyze;
use stat_txlog_rs::host_processing::collect_sources;
use stat_txlog_rs::io_utils::write_result_json;
use stat_txlog_rs::report::Metric;
use tempfile::TempDir;

fn write_log(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut f = fs::File::create(&path).unwrap();
    for line in lines {
        writeln!(f, "{}", line).unwrap();
    }
    path
}

const CLIENT: &[&str] = &[
    r#"{"k":"event","l":"tx_begin","ts":"2021-05-01T10:00:00.500Z","v":{"tx_id":"z"}}"#,
    r#"{"k":"event","l":"start-send-tx","ts":"2021-05-01T10:00:00.800Z","v":{}}"#,
    r#"{"k":"event","l":"tx_begin","ts":"2021-05-01T10:00:01Z","v":{"tx_id":"a"}}"#,
    r#"{"k":"event","l":"tx_commit","ts":"2021-05-01T10:00:02Z","v":{"height":1,"tx_ids":["z","a"]}}"#,
    r#"{"k":"event","l":"tx_begin","ts":"2021-05-01T10:00:03Z","v":{"tx_id":"b"}}"#,
    r#"{"k":"event","l":"tx_commit","ts":"2021-05-01T10:00:04Z","v":{"height":2,"tx_ids":["b"]}}"#,
    r#"{"k":"event","l":"tx_begin","ts":"2021-05-01T10:00:05Z","v":{"tx_id":"c"}}"#,
    r#"{"k":"event","l":"tx_commit","ts":"2021-05-01T10:00:06Z","v":{"height":3,"tx_ids":["c"]}}"#,
    r#"{"k":"event","l":"tx_begin","ts":"2021-05-01T10:00:07Z","v":{"tx_id":"pending"}}"#,
    r#"{"k":"event","l":"end-send-tx","ts":"2021-05-01T10:00:10Z","v":{}}"#,
];

const PEER: &[&str] = &[
    r#"{"k":"event","l":"blk_recv_tx","ts":"2021-05-01T10:00:01.500Z","v":{"tx_id":"a"}}"#,
    r#"{"k":"event","l":"propose_end","ts":"2021-05-01T10:00:01.800Z","v":{"height":1}}"#,
    r#"{"k":"time","l":"mining","t_in_us":4000,"v":{"height":1}}"#,
    r#"{"k":"time","l":"verify_block","t_in_us":50,"v":{"height":1}}"#,
    r#"{"k":"time","l":"verify_block","t_in_us":70,"v":{"height":2}}"#,
    r#"{"k":"time","l":"verify_block","t_in_us":90,"v":{"height":3}}"#,
    r#"{"k":"event","l":"tx_commit","ts":"2021-05-01T10:00:09Z","v":{"height":9,"tx_ids":["a","b"]}}"#,
    r#"{"k":"event","l":"peer_gossip","ts":"2021-05-01T10:00:02Z","v":{"peer":"x"}}"#,
];

const STORAGE: &[&str] = &[
    r#"{"k":"time","l":"exec_time","t_in_us":100,"v":{"task_id":0,"tx_id":"a"}}"#,
    r#"{"k":"time","l":"exec_time","t_in_us":200,"v":{"task_id":1,"tx_id":"b"}}"#,
];

fn value(result: &stat_txlog_rs::report::ResultMap, key: &str) -> f64 {
    result
        .get(key)
        .unwrap_or_else(|| panic!("missing {}", key))
        .as_f64()
}

/// Three transactions sent and committed inside the window
#[test]
fn test_full_run() {
    let dir = TempDir::new().unwrap();
    let client = write_log(dir.path(), "client.log", CLIENT);
    let peer = write_log(dir.path(), "peer0.log", PEER);
    let storage = write_log(dir.path(), "storage0.log", STORAGE);

    let sources = collect_sources(&client, &[peer], &[storage]);
    let result = analyze(&sources).unwrap();

    assert_eq!(result.get("total_tx"), Some(Metric::Count(3)));
    assert_eq!(result.get("committed_tx"), Some(Metric::Count(3)));
    assert_eq!(result.get("conflicted_tx"), Some(Metric::Count(0)));
    assert_eq!(result.get("outdated_tx"), Some(Metric::Count(0)));
    assert_eq!(value(&result, "committed_tx_percentage"), 1.0);

    assert_eq!(value(&result, "tx_latency_mean"), 1_000_000.0);
    assert_eq!(value(&result, "tx_exec_time_mean"), 100.0);
    assert_eq!(value(&result, "tx_propose_time_p50"), 300_000.0);
    assert_eq!(value(&result, "tx_verify_time_p50"), 70.0);

    // block 9 from the peer stream is ignored; blocks 1..=3 are kept
    assert_eq!(result.get("total_blocks"), Some(Metric::Count(3)));
    assert!((value(&result, "throughput") - 0.5).abs() < 1e-9);
    assert!((value(&result, "blk_tx_num_mean") - 4.0 / 3.0).abs() < 1e-9);
    assert!((value(&result, "blk_mining_time_mean") - 4000.0 / 3.0).abs() < 1e-9);

    assert_eq!(result.get("storage_node_1_exec_tx_count"), Some(Metric::Count(2)));
    assert!(result.get("storage_node_2_exec_tx_count").is_none());
    assert_eq!(value(&result, "window_duration"), 9_200_000.0);
}

/// The JSON dump keeps key order
#[test]
fn test_json_output() {
    let dir = TempDir::new().unwrap();
    let client = write_log(dir.path(), "client.log", CLIENT);
    let sources = collect_sources(&client, &[], &[]);
    let result = analyze(&sources).unwrap();

    let out = dir.path().join("result.json");
    write_result_json(&out, &result).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["total_tx"], 3);
    assert!(parsed["tx_verify_time_mean"].is_null());
    let first = text.find("\"total_tx\"").unwrap();
    let later = text.find("\"throughput\"").unwrap();
    assert!(first < later);
}

/// A line that is not JSON aborts the run
#[test]
fn test_malformed_line_is_fatal() {
    let dir = TempDir::new().unwrap();
    let client = write_log(dir.path(), "client.log", CLIENT);
    let peer = write_log(dir.path(), "peer0.log", &[PEER[0], "{oops"]);
    let sources = collect_sources(&client, &[peer], &[]);
    assert!(analyze(&sources).is_err());
}

/// Without an end marker the window is undefined
#[test]
fn test_missing_end_marker() {
    let dir = TempDir::new().unwrap();
    let client = write_log(dir.path(), "client.log", &CLIENT[..CLIENT.len() - 1]);
    let sources = collect_sources(&client, &[], &[]);
    let err = analyze(&sources).unwrap_err();
    assert!(err.to_string().contains("end-send-tx"));
}

/// Pending transactions still count toward the observed send rate
#[test]
fn test_send_rate_counts_pending() {
    let dir = TempDir::new().unwrap();
    let client = write_log(
        dir.path(),
        "client.log",
        &[
            r#"{"k":"event","l":"start-send-tx","ts":"2021-05-01T10:00:00Z","v":{}}"#,
            r#"{"k":"event","l":"tx_begin","ts":"2021-05-01T10:00:01Z","v":{"tx_id":"a"}}"#,
            r#"{"k":"event","l":"tx_begin","ts":"2021-05-01T10:00:02Z","v":{"tx_id":"p1"}}"#,
            r#"{"k":"event","l":"tx_begin","ts":"2021-05-01T10:00:03Z","v":{"tx_id":"p2"}}"#,
            r#"{"k":"event","l":"tx_begin","ts":"2021-05-01T10:00:04Z","v":{"tx_id":"p3"}}"#,
            r#"{"k":"event","l":"tx_commit","ts":"2021-05-01T10:00:05Z","v":{"height":1,"tx_ids":["a"]}}"#,
            r#"{"k":"event","l":"end-send-tx","ts":"2021-05-01T10:00:10Z","v":{}}"#,
        ],
    );
    let sources = collect_sources(&client, &[], &[]);
    let result = analyze(&sources).unwrap();

    assert_eq!(result.get("total_tx"), Some(Metric::Count(1)));
    assert!((value(&result, "tx_send_rate") - 0.4).abs() < 1e-9);
}

/// Unknown records with unexpected field types are skipped, not fatal
#[test]
fn test_unknown_record_with_odd_types() {
    let dir = TempDir::new().unwrap();
    let mut lines = CLIENT.to_vec();
    lines.insert(1, r#"{"k":"time","l":"some_custom_timer","t_in_us":"12","v":{}}"#);
    lines.insert(2, r#"{"k":"event","l":"custom_marker","ts":17,"v":{}}"#);
    let client = write_log(dir.path(), "client.log", &lines);
    let sources = collect_sources(&client, &[], &[]);
    let result = analyze(&sources).unwrap();

    assert_eq!(result.get("total_tx"), Some(Metric::Count(3)));
    assert_eq!(result.get("committed_tx"), Some(Metric::Count(3)));
}
