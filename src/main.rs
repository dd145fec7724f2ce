mod args;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use args::Args;
use stat_txlog_rs::config::DEFAULT_LOG_FILTER;
use stat_txlog_rs::host_processing::collect_sources;
use stat_txlog_rs::io_utils::write_result_json;
use stat_txlog_rs::report::build_table;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if !args.client.exists() {
        return Err(anyhow!("client log not found: {}", args.client.display()));
    }

    let sources = collect_sources(&args.client, &args.peers, &args.storages);
    let result = stat_txlog_rs::analyze(&sources)?;

    build_table(&result).printstd();

    if let Some(path) = &args.output {
        write_result_json(path, &result)?;
        info!(path = %path.display(), "result written");
    }
    Ok(())
}
