//! Append-only writer for the current period's snapshot file.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::{KnownIds, StoreError};
use crate::models::PaperRecord;
use crate::utils::normalize_arxiv_id;

/// Result of writing one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOutcome {
    /// Records actually appended
    pub appended: usize,

    /// Size of the known-id set after the batch
    pub total_known: usize,
}

/// Appends records to one snapshot file, one JSON object per line.
///
/// The file is opened lazily on the first record that is actually new, so a
/// batch of already-known records never touches the disk.
#[derive(Debug)]
pub struct SnapshotWriter {
    path: PathBuf,
    file: Option<File>,
}

impl SnapshotWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append every record whose canonical id is not in `known`, growing `known`
    /// as records are written.
    ///
    /// The canonical id is recomputed from each record's own `id`. An I/O error
    /// aborts the batch; lines already written stay on disk.
    pub fn write_batch(
        &mut self,
        records: &[PaperRecord],
        known: &mut KnownIds,
    ) -> Result<WriteOutcome, StoreError> {
        let pending = pending_lines(records, known)?;
        if pending.is_empty() {
            return Ok(WriteOutcome {
                appended: 0,
                total_known: known.len(),
            });
        }

        let file = self.open()?;
        let result = write_lines(file, pending, known);
        let appended = result.map_err(|e| StoreError::io(&self.path, e))?;

        Ok(WriteOutcome {
            appended,
            total_known: known.len(),
        })
    }

    fn open(&mut self) -> Result<&mut File, StoreError> {
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                let file = open_for_append(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
                tracing::debug!("Opened {} for appending", self.path.display());
                file
            }
        };
        Ok(self.file.insert(file))
    }
}

/// Serialized lines for records not yet in `known`, paired with their
/// canonical id. Repeats within the batch keep the first record.
fn pending_lines(
    records: &[PaperRecord],
    known: &KnownIds,
) -> Result<Vec<(String, String)>, StoreError> {
    let mut batch = HashSet::new();
    let mut pending = Vec::new();

    for record in records {
        let canonical = normalize_arxiv_id(&record.id);
        if canonical.is_empty() || known.contains(&canonical) || !batch.insert(canonical.clone()) {
            tracing::debug!("Skipping known paper {}", record.id);
            continue;
        }

        let mut line = serde_json::to_string(record).map_err(|source| StoreError::Serialize {
            id: record.id.clone(),
            source,
        })?;
        line.push('\n');
        pending.push((canonical, line));
    }

    Ok(pending)
}

/// Write each line and record its id as known once the write succeeds.
/// Stops at the first failure; ids of lines already written stay known.
fn write_lines<W: Write>(
    sink: &mut W,
    lines: Vec<(String, String)>,
    known: &mut KnownIds,
) -> std::io::Result<usize> {
    let mut appended = 0;
    for (canonical, line) in lines {
        sink.write_all(line.as_bytes())?;
        known.insert(canonical);
        appended += 1;
    }
    sink.flush()?;
    Ok(appended)
}

/// Open for appending, creating parent directories, and terminate a dangling
/// last line so the next record starts on its own line.
fn open_for_append(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;

    if file.metadata()?.len() > 0 {
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            file.write_all(b"\n")?;
        }
    }

    Ok(file)
}
