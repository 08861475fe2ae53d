//! Rewrite a snapshot file keeping the first record for each canonical id.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::loader::{raw_line_id, LineProblem};
use super::StoreError;
use crate::utils::normalize_arxiv_id;

/// Counts from one compaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompactStats {
    /// Non-empty lines that parsed as JSON
    pub lines: usize,
    /// Records kept
    pub unique: usize,
    /// Records dropped as repeats of an earlier id
    pub duplicates: usize,
    /// Lines dropped because they were not JSON or had no id
    pub malformed: usize,
}

/// Backup path used by [`compact_snapshot`]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Deduplicate a snapshot file in place.
///
/// The original is first copied to `<file>.bak`. Kept lines are copied byte
/// for byte to a temporary file in the same directory, which then replaces
/// the original.
pub fn compact_snapshot(path: &Path) -> Result<CompactStats, StoreError> {
    let content = fs::read(path).map_err(|e| StoreError::io(path, e))?;

    let backup = backup_path(path);
    fs::write(&backup, &content).map_err(|e| StoreError::io(&backup, e))?;
    tracing::info!("Backed up {} to {}", path.display(), backup.display());

    let mut stats = CompactStats::default();
    let mut seen = HashSet::new();
    let mut kept: Vec<u8> = Vec::with_capacity(content.len());

    for (index, line) in content.split(|b| *b == b'\n').enumerate() {
        let text = String::from_utf8_lossy(line);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        match raw_line_id(text) {
            Ok(raw) => {
                stats.lines += 1;
                if seen.insert(normalize_arxiv_id(&raw)) {
                    kept.extend_from_slice(line);
                    kept.push(b'\n');
                } else {
                    stats.duplicates += 1;
                    tracing::debug!("Duplicate record {} at line {}", raw, index + 1);
                }
            }
            Err(LineProblem::MissingId) => {
                stats.lines += 1;
                stats.malformed += 1;
                tracing::warn!("Line {} has no id", index + 1);
            }
            Err(LineProblem::Malformed(e)) => {
                stats.malformed += 1;
                tracing::warn!("Line {} is not valid JSON: {}", index + 1, e);
            }
        }
    }
    stats.unique = seen.len();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    temp.write_all(&kept)
        .and_then(|_| temp.flush())
        .map_err(|e| StoreError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;

    tracing::info!(
        "Compacted {}: {} unique, {} duplicates, {} malformed",
        path.display(),
        stats.unique,
        stats.duplicates,
        stats.malformed
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_compact_keeps_first_occurrence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arxiv-metadata-oai-snapshot-202508.json");
        let original = "{\"id\": \"2508.00001\", \"title\": \"first\"}\n\
                        {\"id\": \"2508.00002\"}\n\
                        {\"id\": \"2508.00001v2\", \"title\": \"second\"}\n\
                        \n\
                        garbage\n\
                        {\"title\": \"anonymous\"}\n";
        fs::write(&path, original).unwrap();

        let stats = compact_snapshot(&path).unwrap();
        assert_eq!(
            stats,
            CompactStats {
                lines: 4,
                unique: 2,
                duplicates: 1,
                malformed: 2,
            }
        );

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "{\"id\": \"2508.00001\", \"title\": \"first\"}\n{\"id\": \"2508.00002\"}\n"
        );
        assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), original);
    }

    #[test]
    fn test_compact_preserves_line_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arxiv-metadata-oai-snapshot-202508.json");
        let kept: &[u8] = b"{\"id\": \"2508.00001\", \"title\": \"caf\xff\xfe\"}  \r";
        let mut original = kept.to_vec();
        original.extend_from_slice(b"\n{\"id\": \"2508.00001v3\"}\n");
        fs::write(&path, &original).unwrap();

        let stats = compact_snapshot(&path).unwrap();
        assert_eq!(stats.duplicates, 1);

        let mut expected = kept.to_vec();
        expected.push(b'\n');
        assert_eq!(fs::read(&path).unwrap(), expected);
    }

    #[test]
    fn test_compact_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = compact_snapshot(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }
}
