//! Markdown summary of a harvest run.

use chrono::{DateTime, Local};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::harvest::RunSummary;
use crate::models::Period;
use crate::store::{snapshot_file_name, MetadataStore, StoreError, SNAPSHOT_BASENAME};

/// Per-archive tallies shown in the cumulative section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryStats {
    /// Not requested for this run
    Skipped,
    /// Requested but the snapshot could not be read
    Unavailable(String),
    /// Occurrences per archive, sorted by name
    Counts(BTreeMap<String, usize>),
}

/// Everything the report shows
#[derive(Debug, Clone)]
pub struct ReportData<'a> {
    pub summary: &'a RunSummary,
    pub period: Period,
    /// Known ids across the store after the run
    pub total_known: usize,
    pub category_stats: CategoryStats,
    pub generated_at: DateTime<Local>,
}

/// Archive part of a category tag: `cs.LG` -> `cs`, `acc-phys/9507001` -> `acc-phys`
pub fn archive_of(category: &str) -> &str {
    if let Some((archive, _)) = category.split_once('.') {
        archive
    } else if let Some((archive, _)) = category.split_once('/') {
        archive
    } else {
        category
    }
}

/// Count category occurrences per archive in one snapshot file.
///
/// `categories` may be a JSON array or a comma-separated string. A missing
/// file counts as empty; unparsable lines are skipped.
pub fn tally_categories(path: &Path) -> Result<BTreeMap<String, usize>, StoreError> {
    let mut counts = BTreeMap::new();
    if !path.exists() {
        return Ok(counts);
    }

    let reader = BufReader::new(File::open(path).map_err(|e| StoreError::io(path, e))?);
    for line in reader.split(b'\n') {
        let line = line.map_err(|e| StoreError::io(path, e))?;
        let Ok(value) = serde_json::from_slice::<Value>(&line) else {
            continue;
        };

        let tags: Vec<String> = match value.get("categories") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(joined)) => joined.split(',').map(|c| c.trim().to_string()).collect(),
            _ => continue,
        };

        for tag in tags.iter().filter(|t| !t.is_empty()) {
            *counts.entry(archive_of(tag).to_string()).or_insert(0) += 1;
        }
    }

    Ok(counts)
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// Render the report text
pub fn render_report(data: &ReportData<'_>) -> String {
    let summary = data.summary;

    let mut out = format!(
        "# arXiv Metadata Harvest Report\n\
         **Generated**: {}\n\n\
         ## This Run\n\
         - new_papers_count: {}\n\
         - topics_processed: {}\n\
         - successful_topics: {}\n\
         - failed_topics: {}\n\n",
        data.generated_at.format("%Y-%m-%d %H:%M:%S"),
        summary.new_papers_count,
        summary.topics.len(),
        list_or_none(&summary.successful),
        list_or_none(&summary.failed)
    );

    out.push_str("### Papers per topic\n");
    if summary.topic_paper_counts.is_empty() {
        out.push_str("- none\n");
    }
    for (topic, count) in &summary.topic_paper_counts {
        out.push_str(&format!("- {}: {} papers\n", topic, count));
    }

    out.push_str("\n### Failed topic details\n");
    if summary.topic_errors.is_empty() {
        out.push_str("- none\n");
    }
    for (topic, error) in &summary.topic_errors {
        out.push_str(&format!("- {}: {}\n", topic, error));
    }

    out.push_str(&format!(
        "\n## Cumulative\n- {} total: {}\n\n### Papers per archive\n",
        SNAPSHOT_BASENAME, data.total_known
    ));
    match &data.category_stats {
        CategoryStats::Skipped => {
            out.push_str("- skipped (use --include-category-stats to compute)\n");
        }
        CategoryStats::Unavailable(reason) => {
            out.push_str(&format!("- unavailable: {}\n", reason));
        }
        CategoryStats::Counts(counts) if counts.is_empty() => {
            out.push_str("- no category data yet\n");
        }
        CategoryStats::Counts(counts) => {
            for (archive, count) in counts {
                out.push_str(&format!("- {}: {} papers\n", archive, count));
            }
        }
    }

    out.push_str(&format!(
        "\n## Files\n- Metadata file: {}\n\n---\n*Generated by {} {}*\n",
        snapshot_file_name(data.period),
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));

    out
}

/// Build and write the period's report.
///
/// The known-id total is reloaded from disk so it reflects this run's writes.
/// Failures are logged and yield `None`; they never fail the run.
pub fn generate_report(
    store: &MetadataStore,
    summary: &RunSummary,
    skip_undated: bool,
    include_category_stats: bool,
) -> Option<PathBuf> {
    let total_known = match store.load_known_ids(skip_undated) {
        Ok(known) => known.len(),
        Err(e) => {
            tracing::warn!("Could not reload known ids for the report: {}", e);
            0
        }
    };

    let category_stats = if include_category_stats {
        match tally_categories(&store.snapshot_path()) {
            Ok(counts) => CategoryStats::Counts(counts),
            Err(e) => {
                tracing::warn!("Category tally failed: {}", e);
                CategoryStats::Unavailable(e.to_string())
            }
        }
    } else {
        CategoryStats::Skipped
    };

    let data = ReportData {
        summary,
        period: store.period(),
        total_known,
        category_stats,
        generated_at: Local::now(),
    };
    let content = render_report(&data);

    let path = store.report_path();
    let written = std::fs::create_dir_all(store.dir()).and_then(|_| std::fs::write(&path, &content));
    match written {
        Ok(()) => {
            tracing::info!("Report written to {}", path.display());
            Some(path)
        }
        Err(e) => {
            tracing::error!("Failed to write report {}: {}", path.display(), e);
            tracing::info!("{}", content);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn summary() -> RunSummary {
        RunSummary {
            new_papers_count: 3,
            topics: vec!["cs".into(), "math".into()],
            successful: vec!["cs".into()],
            failed: vec!["math".into()],
            topic_paper_counts: vec![("cs".into(), 5)],
            topic_errors: vec![("math".into(), "HTTP error: 400 Bad Request".into())],
        }
    }

    #[test]
    fn test_archive_of() {
        assert_eq!(archive_of("cs.LG"), "cs");
        assert_eq!(archive_of("acc-phys/9507001"), "acc-phys");
        assert_eq!(archive_of("hep-th"), "hep-th");
    }

    #[test]
    fn test_render_report() {
        let summary = summary();
        let mut counts = BTreeMap::new();
        counts.insert("math".to_string(), 1);
        counts.insert("cs".to_string(), 4);

        let report = render_report(&ReportData {
            summary: &summary,
            period: Period::new(2025, 8).unwrap(),
            total_known: 42,
            category_stats: CategoryStats::Counts(counts),
            generated_at: Local.with_ymd_and_hms(2025, 8, 20, 9, 30, 0).unwrap(),
        });

        assert!(report.contains("**Generated**: 2025-08-20 09:30:00"));
        assert!(report.contains("- new_papers_count: 3\n"));
        assert!(report.contains("- topics_processed: 2\n"));
        assert!(report.contains("- failed_topics: math\n"));
        assert!(report.contains("- cs: 5 papers\n"));
        assert!(report.contains("- math: HTTP error: 400 Bad Request\n"));
        assert!(report.contains("- arxiv-metadata-oai-snapshot total: 42\n"));
        assert!(report.contains("- cs: 4 papers\n- math: 1 papers\n"));
        assert!(report.contains("arxiv-metadata-oai-snapshot-202508.json"));
    }

    #[test]
    fn test_render_skipped_stats() {
        let summary = RunSummary::default();
        let report = render_report(&ReportData {
            summary: &summary,
            period: Period::new(2025, 8).unwrap(),
            total_known: 0,
            category_stats: CategoryStats::Skipped,
            generated_at: Local::now(),
        });
        assert!(report.contains("- failed_topics: none\n"));
        assert!(report.contains("--include-category-stats"));
    }

    #[test]
    fn test_tally_categories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(
            &path,
            "{\"categories\": [\"cs.LG\", \"stat.ML\"]}\n\
             {\"categories\": \"cs.AI, math.CO\"}\n\
             {\"categories\": [\"hep-th\"]}\n\
             broken\n",
        )
        .unwrap();

        let counts = tally_categories(&path).unwrap();
        let expected: Vec<(&str, usize)> =
            vec![("cs", 2), ("hep-th", 1), ("math", 1), ("stat", 1)];
        let actual: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(actual, expected);

        assert!(tally_categories(&dir.path().join("absent.json")).unwrap().is_empty());
    }

    #[test]
    fn test_generate_report_writes_file() {
        let dir = TempDir::new().unwrap();
        let store = MetadataStore::for_period(dir.path(), Period::new(2025, 8).unwrap());
        std::fs::write(
            store.snapshot_path(),
            "{\"id\": \"2508.00001\", \"categories\": [\"cs.LG\"]}\n",
        )
        .unwrap();

        let path = generate_report(&store, &summary(), false, true).unwrap();
        assert_eq!(path, dir.path().join("metadata-report-202508.md"));

        let report = std::fs::read_to_string(path).unwrap();
        assert!(report.contains("- arxiv-metadata-oai-snapshot total: 1\n"));
        assert!(report.contains("- cs: 1 papers\n"));
    }
}
