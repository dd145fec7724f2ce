use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::model::EventRecord;
use crate::report::ResultMap;

/// A parsed record with its 1-based line number.
#[derive(Debug, Clone)]
pub struct NumberedRecord {
    pub line: usize,
    pub record: EventRecord,
}

/// Reads a whole event log. Any line that is not a JSON event object fails
/// the load; whitespace-only lines are skipped.
pub fn load_event_log(path: &Path) -> Result<Vec<NumberedRecord>> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_event_log(&text).with_context(|| format!("parse event log {}", path.display()))
}

pub fn parse_event_log(text: &str) -> Result<Vec<NumberedRecord>> {
    let mut out = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let record: EventRecord =
            serde_json::from_str(raw).with_context(|| format!("line {}: invalid JSON event", idx + 1))?;
        out.push(NumberedRecord {
            line: idx + 1,
            record,
        });
    }
    Ok(out)
}

pub fn write_result_json(path: &Path, result: &ResultMap) -> Result<()> {
    let body = serde_json::to_string_pretty(result).context("serialize result")?;
    fs::write(path, body).with_context(|| format!("write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Line numbers survive blank lines
    #[test]
    fn test_parse_event_log() {
        let text = concat!(
            r#"{"k":"event","l":"tx_begin","ts":"2021-01-01T00:00:00Z","v":{"tx_id":"a"}}"#,
            "\n\n",
            r#"{"k":"time","l":"mining","t_in_us":12.5,"v":{"height":3}}"#,
            "\n"
        );
        let records = parse_event_log(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 1);
        assert_eq!(records[0].record.l, "tx_begin");
        assert_eq!(records[1].line, 3);
        assert_eq!(records[1].record.t_in_us, Some(serde_json::json!(12.5)));
    }

    /// A malformed line fails the whole log and names the line
    #[test]
    fn test_parse_event_log_malformed() {
        let text = "{\"k\":\"event\",\"l\":\"x\"}\nnot json\n";
        let err = parse_event_log(text).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    /// Field types are left to the handlers
    #[test]
    fn test_parse_event_log_odd_field_types() {
        let text = r#"{"k":"time","l":"some_custom_timer","t_in_us":"12","ts":7,"v":{}}"#;
        let records = parse_event_log(text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record.l, "some_custom_timer");
    }

    /// Objects missing the kind or label are malformed too
    #[test]
    fn test_parse_event_log_missing_label() {
        assert!(parse_event_log("{\"k\":\"event\"}").is_err());
    }
}
