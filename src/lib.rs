pub mod analyzer;
pub mod config;
pub mod host_processing;
pub mod io_utils;
pub mod model;
pub mod reconstruct;
pub mod report;
pub mod session;
pub mod stats;
pub mod window;

use anyhow::Result;
use std::time::Instant;
use tracing::debug;

use host_processing::{load_and_apply_streams, StreamSource};
use report::ResultMap;
use session::Session;

/// Runs the whole batch: reconstruct, filter to the send window, aggregate.
pub fn analyze(sources: &[StreamSource]) -> Result<ResultMap> {
    let mut session = Session::new();

    let t_load = Instant::now();
    load_and_apply_streams(sources, &mut session)?;
    debug!(elapsed = ?t_load.elapsed(), "load_and_apply_streams");

    let window = window::apply_window(&mut session)?;

    let t_aggregate = Instant::now();
    let result = analyzer::aggregate(&session, &window);
    debug!(elapsed = ?t_aggregate.elapsed(), "aggregate");
    Ok(result)
}
