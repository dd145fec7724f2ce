use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::config::REPORTED_PERCENTILES;

/// Mean and the reported percentiles of one series.
#[derive(Debug, Clone)]
pub struct Statistics {
    pub avg: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub cnt: usize,
}

impl Statistics {
    pub fn nan() -> Self {
        Statistics {
            avg: f64::NAN,
            p50: f64::NAN,
            p90: f64::NAN,
            p95: f64::NAN,
            cnt: 0,
        }
    }

    /// `(suffix, value)` pairs in report order.
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("mean", self.avg),
            ("p50", self.p50),
            ("p90", self.p90),
            ("p95", self.p95),
        ]
    }
}

pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        bail!("mean of an empty sequence");
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Linear-interpolated percentile (R-7). `p` is in `[0, 1]`.
///
/// When `sorted` is true the caller guarantees `values` is ascending and no
/// copy is made. Returns `NaN` for an empty slice.
pub fn percentile(values: &[f64], p: f64, sorted: bool) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    if !sorted {
        let mut owned = values.to_vec();
        sort_f64(&mut owned);
        return percentile(&owned, p, true);
    }
    if values.len() == 1 {
        return values[0];
    }

    let rank = p * (values.len() - 1) as f64;
    let k = rank.floor() as usize;
    let f = rank - k as f64;
    match values.get(k + 1) {
        Some(next) => values[k] + f * (next - values[k]),
        None => values[k],
    }
}

/// `b - a` in microseconds. Negative when `b` precedes `a`.
pub fn time_difference_in_us(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    let delta = b.signed_duration_since(a);
    match delta.num_microseconds() {
        Some(us) => us as f64,
        None => delta.num_milliseconds() as f64 * 1000.0,
    }
}

pub fn sort_f64(data: &mut [f64]) {
    data.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
}

pub fn statistics_from_sorted(data: &[f64]) -> Statistics {
    let avg = match mean(data) {
        Ok(v) => v,
        Err(_) => return Statistics::nan(),
    };
    let [p50, p90, p95] = REPORTED_PERCENTILES.map(|q| percentile(data, q, true));
    Statistics {
        avg,
        p50,
        p90,
        p95,
        cnt: data.len(),
    }
}

pub fn statistics_from_vec(mut data: Vec<f64>) -> Statistics {
    sort_f64(&mut data);
    statistics_from_sorted(&data)
}
