//! Load, harvest, report: one complete run against a store directory.

use std::path::PathBuf;

use super::{HarvestError, Harvester, RunState, RunSummary};
use crate::models::{DateRange, HarvestTopic, MAIN_CATEGORIES};
use crate::report::generate_report;
use crate::sources::FeedClient;
use crate::store::{KnownIds, MetadataStore};

/// Switches for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Ignore undated snapshot files when building the known-id set
    pub skip_undated: bool,

    /// Tally per-archive counts for the report
    pub include_category_stats: bool,
}

/// What a completed run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,

    /// Known ids before the first request
    pub initial_known: usize,

    /// Known ids after the run
    pub known: KnownIds,

    /// Report location, if it could be written
    pub report: Option<PathBuf>,
}

/// Topics for one run.
///
/// A date range yields the single `date_range` topic capped at `max_results`
/// (unbounded when `None`). Otherwise each archive gets a `cat:<archive>*`
/// topic capped at `max_results` or `default_max_results`; an empty
/// `archives` list means every main archive.
pub fn plan_topics(
    date_range: Option<DateRange>,
    archives: &[String],
    max_results: Option<usize>,
    default_max_results: usize,
) -> Vec<HarvestTopic> {
    if let Some(range) = date_range {
        return vec![HarvestTopic::date_range(range).max_results(max_results)];
    }

    let cap = Some(max_results.unwrap_or(default_max_results));
    if archives.is_empty() {
        MAIN_CATEGORIES
            .iter()
            .map(|archive| HarvestTopic::category(archive).max_results(cap))
            .collect()
    } else {
        archives
            .iter()
            .map(|archive| HarvestTopic::category(archive).max_results(cap))
            .collect()
    }
}

/// Run the whole pipeline: scan the store, harvest every topic into the
/// current period's snapshot, then write the period report.
///
/// Report failures are logged and leave `report` empty. Store failures abort
/// the run before any report is written.
pub async fn run_pipeline<C: FeedClient>(
    harvester: &Harvester<C>,
    store: &MetadataStore,
    topics: &[HarvestTopic],
    options: RunOptions,
) -> Result<RunOutcome, HarvestError> {
    let known = store.load_known_ids(options.skip_undated)?;
    let initial_known = known.len();
    tracing::info!(
        "Starting run over {} topics with {} known papers, writing to {}",
        topics.len(),
        initial_known,
        store.snapshot_path().display()
    );

    let mut state = RunState::new(known, store.writer());
    let summary = harvester.harvest(topics, &mut state).await?;
    tracing::info!(
        "Run finished: {} new papers, {} topics failed",
        summary.new_papers_count,
        summary.failed.len()
    );

    let report = generate_report(
        store,
        &summary,
        options.skip_undated,
        options.include_category_stats,
    );

    Ok(RunOutcome {
        summary,
        initial_known,
        known: state.into_known(),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DATE_RANGE_TOPIC;

    #[test]
    fn test_plan_all_archives() {
        let topics = plan_topics(None, &[], None, 100);
        assert_eq!(topics.len(), MAIN_CATEGORIES.len());
        assert!(topics.iter().all(|t| t.max_results == Some(100)));
        assert_eq!(topics[0].query, "cat:astro-ph*");
    }

    #[test]
    fn test_plan_selected_archives() {
        let topics = plan_topics(None, &["cs".to_string(), "stat".to_string()], Some(20), 100);
        let labels: Vec<&str> = topics.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["cs", "stat"]);
        assert_eq!(topics[1].max_results, Some(20));
    }

    #[test]
    fn test_plan_date_range_is_unbounded_by_default() {
        let range: DateRange = "2025-08-01,2025-08-31".parse().unwrap();
        let topics = plan_topics(Some(range), &["cs".to_string()], None, 100);
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].label, DATE_RANGE_TOPIC);
        assert_eq!(topics[0].max_results, None);

        let topics = plan_topics(Some(range), &[], Some(500), 100);
        assert_eq!(topics[0].max_results, Some(500));
    }
}
