use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::io_utils::{load_event_log, NumberedRecord};
use crate::model::StreamRole;
use crate::reconstruct::{apply_record, Outcome};
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct StreamSource {
    pub path: PathBuf,
    pub role: StreamRole,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamCounts {
    pub applied: usize,
    pub ignored: usize,
    pub unrecognized: usize,
    pub missing_storage_id: usize,
}

/// Client first, then peers, then storage nodes numbered from 1.
pub fn collect_sources(client: &Path, peers: &[PathBuf], storages: &[PathBuf]) -> Vec<StreamSource> {
    let mut sources = Vec::with_capacity(1 + peers.len() + storages.len());
    sources.push(StreamSource {
        path: client.to_path_buf(),
        role: StreamRole::Client,
    });
    for p in peers {
        sources.push(StreamSource {
            path: p.clone(),
            role: StreamRole::Peer,
        });
    }
    for (idx, p) in storages.iter().enumerate() {
        sources.push(StreamSource {
            path: p.clone(),
            role: StreamRole::Storage(idx as u32 + 1),
        });
    }
    sources
}

/// Applies records of one stream in file order.
pub fn apply_stream(
    session: &mut Session,
    path: &Path,
    role: StreamRole,
    records: &[NumberedRecord],
) -> Result<StreamCounts> {
    let mut counts = StreamCounts::default();
    for NumberedRecord { line, record } in records {
        let outcome = apply_record(session, role, record)
            .with_context(|| format!("{}:{}", path.display(), line))?;
        match outcome {
            Outcome::Applied => counts.applied += 1,
            Outcome::Ignored => {
                counts.ignored += 1;
                debug!(file = %path.display(), line, label = %record.l, ?role, "event not accepted from this stream");
            }
            Outcome::MissingStorageId => {
                counts.missing_storage_id += 1;
                warn!(
                    file = %path.display(),
                    line,
                    label = %record.l,
                    ?role,
                    "exec_time outside a storage-node stream, skipped"
                );
            }
            Outcome::Unrecognized => {
                counts.unrecognized += 1;
                warn!(
                    file = %path.display(),
                    line,
                    kind = %record.k,
                    label = %record.l,
                    "unrecognized event, skipped"
                );
            }
        }
    }
    Ok(counts)
}

/// Loads every source fully, then applies them one at a time in order.
pub fn load_and_apply_streams(sources: &[StreamSource], session: &mut Session) -> Result<()> {
    let mut loaded = Vec::with_capacity(sources.len());
    for source in sources {
        loaded.push(load_event_log(&source.path)?);
    }

    for (source, records) in sources.iter().zip(&loaded) {
        let counts = apply_stream(session, &source.path, source.role, records)?;
        info!(
            file = %source.path.display(),
            role = ?source.role,
            applied = counts.applied,
            ignored = counts.ignored,
            unrecognized = counts.unrecognized,
            missing_storage_id = counts.missing_storage_id,
            "stream processed"
        );
    }
    Ok(())
}
