//! Scan persisted snapshot files for already-known paper IDs.

use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{KnownIds, MetadataStore, SnapshotFile, StoreError};
use crate::utils::normalize_arxiv_id;

/// What went wrong with one line of a snapshot file
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineProblem {
    Malformed(String),
    MissingId,
}

/// Extract the `id` field of one JSON line, not yet normalized
pub(crate) fn raw_line_id(line: &str) -> Result<String, LineProblem> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| LineProblem::Malformed(e.to_string()))?;
    match value.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(LineProblem::MissingId),
    }
}

impl MetadataStore {
    /// Build the set of canonical IDs already persisted in this store.
    ///
    /// Dated files newer than the store's period are ignored, as are undated
    /// files when `skip_undated` is set. Malformed lines are logged and skipped;
    /// a file that cannot be read is logged and skipped as a whole.
    pub fn load_known_ids(&self, skip_undated: bool) -> Result<KnownIds, StoreError> {
        let mut known = KnownIds::new();

        if !self.dir().exists() {
            tracing::info!("Metadata directory {} does not exist yet", self.dir().display());
            return Ok(known);
        }

        for file in self.snapshot_files()? {
            if !self.includes(&file, skip_undated) {
                tracing::debug!("Skipping {}", file.path.display());
                continue;
            }

            let before = known.len();
            match scan_file(&file.path, &mut known) {
                Ok(lines) => tracing::info!(
                    "Loaded {} ids ({} new) from {}",
                    lines,
                    known.len() - before,
                    file.path.display()
                ),
                Err(e) => tracing::warn!("Failed to read {}: {}", file.path.display(), e),
            }
        }

        tracing::info!("{} known paper ids in {}", known.len(), self.dir().display());
        Ok(known)
    }

    fn includes(&self, file: &SnapshotFile, skip_undated: bool) -> bool {
        match file.period {
            None => !skip_undated,
            Some(period) => period <= self.period(),
        }
    }
}

/// Read one snapshot file into `known`, returning the number of ids read
fn scan_file(path: &Path, known: &mut KnownIds) -> std::io::Result<usize> {
    let reader = BufReader::new(File::open(path)?);
    let mut count = 0;

    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match raw_line_id(line) {
            Ok(raw) => {
                known.insert(normalize_arxiv_id(&raw));
                count += 1;
            }
            Err(LineProblem::Malformed(e)) => {
                tracing::warn!("{}:{}: malformed JSON: {}", path.display(), index + 1, e)
            }
            Err(LineProblem::MissingId) => {
                tracing::warn!("{}:{}: record has no id", path.display(), index + 1)
            }
        }
    }

    Ok(count)
}
