use prettytable::{Cell, Row, Table};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One scalar of the result, tagged with how it should be shown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Count(u64),
    /// Plain number, e.g. transactions per block.
    Number(f64),
    Ratio(f64),
    /// Microseconds.
    Duration(f64),
    /// Transactions per second.
    Rate(f64),
}

impl Metric {
    pub fn as_f64(self) -> f64 {
        match self {
            Metric::Count(n) => n as f64,
            Metric::Number(v) | Metric::Ratio(v) | Metric::Duration(v) | Metric::Rate(v) => v,
        }
    }

    pub fn display(self) -> String {
        match self {
            Metric::Count(n) => n.to_string(),
            Metric::Number(v) if v.is_nan() => "nan".to_string(),
            Metric::Number(v) => format!("{:.2}", v),
            Metric::Ratio(v) => format_percentage(v),
            Metric::Duration(v) => format_time_us(v),
            Metric::Rate(v) if v.is_nan() => "nan".to_string(),
            Metric::Rate(v) => format!("{:.2} tx/s", v),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Metric::Count(n) => serializer.serialize_u64(n),
            // serde_json writes non-finite floats as null
            other => serializer.serialize_f64(other.as_f64()),
        }
    }
}

/// Flat metric-name → value mapping, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ResultMap {
    entries: Vec<(String, Metric)>,
}

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the value in place when the key already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: Metric) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<Metric> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Metric)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ResultMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

pub fn format_percentage(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    format!("{:.2}%", v * 100.0)
}

/// Picks μs, ms or s by magnitude.
pub fn format_time_us(us: f64) -> String {
    if us.is_nan() {
        return "nan".to_string();
    }
    let abs = us.abs();
    if abs < 1_000.0 {
        format!("{:.2}μs", us)
    } else if abs < 1_000_000.0 {
        format!("{:.2}ms", us / 1_000.0)
    } else {
        format!("{:.2}s", us / 1_000_000.0)
    }
}

pub fn build_table(result: &ResultMap) -> Table {
    let mut table = Table::new();
    table.set_titles(Row::new(vec![Cell::new("metric"), Cell::new("value")]));
    for (name, value) in result.iter() {
        table.add_row(Row::new(vec![Cell::new(name), Cell::new(&value.display())]));
    }
    table
}
