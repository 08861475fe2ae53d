//! Line-delimited JSON snapshot store.
//!
//! The store is a directory holding one `arxiv-metadata-oai-snapshot-YYYYMM.json`
//! file per period (plus, optionally, an undated `arxiv-metadata-oai-snapshot.json`
//! imported from elsewhere). Each line is one JSON paper record. Files are only
//! ever appended to by the harvester; together they form one logical log in which
//! every canonical `id` appears at most once.

mod compact;
mod loader;
mod writer;

pub use compact::{compact_snapshot, CompactStats};
pub use writer::{SnapshotWriter, WriteOutcome};

use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::models::Period;

/// Base name shared by every snapshot file
pub const SNAPSHOT_BASENAME: &str = "arxiv-metadata-oai-snapshot";

/// Base name of the per-period report
pub const REPORT_BASENAME: &str = "metadata-report";

fn snapshot_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^arxiv-metadata-oai-snapshot(?:-(\d{6}))?\.json$").ok())
        .as_ref()
}

/// Errors raised while reading or writing store files
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize record {id}: {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Canonical IDs already persisted. Grows during a run, never shrinks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownIds {
    ids: HashSet<String>,
}

impl KnownIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, canonical_id: &str) -> bool {
        self.ids.contains(canonical_id)
    }

    /// Returns `true` if the id was not known before
    pub fn insert(&mut self, canonical_id: impl Into<String>) -> bool {
        self.ids.insert(canonical_id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<String> for KnownIds {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl Extend<String> for KnownIds {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.ids.extend(iter);
    }
}

/// A snapshot file found in the store directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    pub path: PathBuf,

    /// Period suffix, `None` for the undated base file
    pub period: Option<Period>,
}

/// Snapshot file name for a period
pub fn snapshot_file_name(period: Period) -> String {
    format!("{}-{}.json", SNAPSHOT_BASENAME, period)
}

/// Report file name for a period
pub fn report_file_name(period: Period) -> String {
    format!("{}-{}.md", REPORT_BASENAME, period)
}

/// Parse a file name against the snapshot naming pattern.
///
/// Returns `None` when the name is not a snapshot file, `Some(None)` for the
/// undated base file, and `Some(Some(period))` for a dated one.
pub fn parse_snapshot_name(file_name: &str) -> Option<Option<Period>> {
    let captures = snapshot_pattern()?.captures(file_name)?;
    match captures.get(1) {
        None => Some(None),
        Some(suffix) => suffix.as_str().parse().ok().map(Some),
    }
}

/// The on-disk store for one run: a directory and the period being written.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    dir: PathBuf,
    period: Period,
}

impl MetadataStore {
    /// Store writing into the current wall-clock period
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::for_period(dir, Period::current())
    }

    pub fn for_period(dir: impl Into<PathBuf>, period: Period) -> Self {
        Self {
            dir: dir.into(),
            period,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// Snapshot file the current period appends to
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(snapshot_file_name(self.period))
    }

    /// Report file for the current period
    pub fn report_path(&self) -> PathBuf {
        self.dir.join(report_file_name(self.period))
    }

    /// Writer appending to the current period's snapshot file
    pub fn writer(&self) -> SnapshotWriter {
        SnapshotWriter::new(self.snapshot_path())
    }

    /// List snapshot files in the store directory, sorted by name.
    ///
    /// A missing directory yields an empty list.
    pub fn snapshot_files(&self) -> Result<Vec<SnapshotFile>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            match parse_snapshot_name(name) {
                Some(period) => files.push(SnapshotFile {
                    path: entry.path(),
                    period,
                }),
                None => continue,
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}
