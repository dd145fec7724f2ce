use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Rebuild tx/block timelines from benchmark event logs and report latency and throughput")]
pub struct Args {
    /// Event log written by the benchmark client
    #[arg(short = 'c', long = "client")]
    pub client: PathBuf,

    /// Event logs of peer nodes (repeatable)
    #[arg(short = 'p', long = "peer")]
    pub peers: Vec<PathBuf>,

    /// Event logs of storage nodes, numbered from 1 in the order given (repeatable)
    #[arg(short = 's', long = "storage")]
    pub storages: Vec<PathBuf>,

    /// Also write the result as pretty-printed JSON to this file
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}
