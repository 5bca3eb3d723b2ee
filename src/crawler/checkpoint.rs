//! Checkpoint engine: atomic snapshot of crawl progress
//!
//! Snapshot layout, text with a binary tail:
//!
//! ```text
//! <numCrawledTotal> <frontierSize>\n
//! <frontier url>\n            (frontierSize lines)
//! \n                          (blank separator)
//! <raw Bloom-filter bit stream>
//! ```
//!
//! Creation writes to a temp file in the system temp directory and then
//! copy-overwrites the configured path, so a reader never observes a partial
//! snapshot. Loading tolerates individually malformed URL lines (they are
//! skipped) but fails hard when the file itself cannot be opened.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::net::Url;
use crate::routing::BloomFilter;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed checkpoint: {0}")]
    Format(&'static str),
}

/// Counters and frontier recovered from a snapshot
pub struct LoadedCheckpoint {
    pub total_crawled: u64,
    pub frontier: HashSet<Url>,
}

/// Write a snapshot of the frontier and the scheduled-set.
///
/// The caller holds both the frontier and scheduled-set locks for the full
/// duration (stop-the-world checkpointing).
pub fn write_checkpoint(
    path: &Path,
    total_crawled: u64,
    frontier: &HashSet<Url>,
    scheduled: &BloomFilter,
) -> Result<(), CheckpointError> {
    let file_name = path
        .file_name()
        .ok_or(CheckpointError::Format("checkpoint path has no file name"))?;
    let temp_path = std::env::temp_dir().join(file_name);

    let mut writer = BufWriter::new(File::create(&temp_path)?);
    writeln!(writer, "{} {}", total_crawled, frontier.len())?;
    for url in frontier {
        writeln!(writer, "{url}")?;
    }
    writeln!(writer)?;
    scheduled.write_to(&mut writer)?;
    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;

    fs::copy(&temp_path, path)?;
    fs::remove_file(&temp_path)?;
    Ok(())
}

/// Load a snapshot, filling `scheduled` in place from the binary tail.
pub fn load_checkpoint(
    path: &Path,
    scheduled: &mut BloomFilter,
) -> Result<LoadedCheckpoint, CheckpointError> {
    let mut reader = BufReader::new(File::open(path)?);

    let mut header = String::new();
    reader.read_line(&mut header)?;
    let mut fields = header.split_whitespace();
    let total_crawled: u64 = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or(CheckpointError::Format("missing crawled counter"))?;
    let frontier_size: usize = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or(CheckpointError::Format("missing frontier size"))?;

    let mut frontier = HashSet::with_capacity(frontier_size);
    let mut line = String::new();
    for _ in 0..frontier_size {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(CheckpointError::Format("truncated frontier section"));
        }
        // Individually malformed entries cost one URL, not the snapshot.
        if let Ok(url) = Url::parse(line.trim_end()) {
            if url.is_absolute() {
                frontier.insert(url);
            }
        }
    }

    // Blank separator between the URL lines and the Bloom tail.
    line.clear();
    reader.read_line(&mut line)?;

    scheduled.read_from(&mut reader)?;

    Ok(LoadedCheckpoint {
        total_crawled,
        frontier,
    })
}
