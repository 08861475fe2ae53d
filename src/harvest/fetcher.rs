//! The paginated fetch loop.

use std::collections::HashSet;
use tokio::time::sleep;

use super::{HarvestError, HarvestSettings, RunState, RunSummary, TopicOutcome};
use crate::models::{HarvestTopic, PaperRecord};
use crate::sources::{parse_feed, FeedClient, PageRequest};
use crate::utils::{normalize_arxiv_id, with_retry};

/// Pages through topics with one feed client
#[derive(Debug)]
pub struct Harvester<C: FeedClient> {
    client: C,
    settings: HarvestSettings,
}

impl<C: FeedClient> Harvester<C> {
    pub fn new(client: C, settings: HarvestSettings) -> Self {
        Self { client, settings }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn settings(&self) -> &HarvestSettings {
        &self.settings
    }

    /// Harvest every topic in order.
    ///
    /// A topic that fails on the feed side is recorded in the summary and the
    /// run moves on. A store failure ends the run.
    pub async fn harvest(
        &self,
        topics: &[HarvestTopic],
        state: &mut RunState,
    ) -> Result<RunSummary, HarvestError> {
        let mut summary = RunSummary::default();

        for topic in topics {
            tracing::info!(
                "Harvesting topic {} ({}) from {}",
                topic.label,
                topic.query,
                self.client.name()
            );

            match self.fetch_topic(topic, state).await {
                Ok(outcome) => {
                    tracing::info!(
                        "Topic {}: {} papers returned, {} new",
                        topic.label,
                        outcome.records.len(),
                        outcome.written
                    );
                    summary.record_success(&topic.label, &outcome);
                }
                Err(e) if e.is_fatal() => {
                    tracing::error!("Topic {} hit a store error, aborting run: {}", topic.label, e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::error!("Topic {} failed: {}", topic.label, e);
                    summary.record_failure(&topic.label, &e);
                }
            }
        }

        summary.new_papers_count = state.written();
        Ok(summary)
    }

    /// Page through one topic until the feed runs dry or the topic's cap is
    /// reached, writing each page's new papers before the next request.
    pub async fn fetch_topic(
        &self,
        topic: &HarvestTopic,
        state: &mut RunState,
    ) -> Result<TopicOutcome, HarvestError> {
        let page_size = self.settings.page_size.max(1);
        let target = topic.max_results.unwrap_or(usize::MAX);

        let mut outcome = TopicOutcome::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut start = 0;
        let mut empty_streak = 0;

        while start < target && empty_streak < self.settings.max_empty_pages {
            sleep(self.settings.page_delay).await;

            let request = PageRequest::new(&topic.query, start, page_size.min(target - start));
            let (client, page_request) = (&self.client, &request);
            let body =
                with_retry(&self.settings.retry, move || client.fetch_page(page_request)).await?;
            outcome.pages += 1;

            let page = parse_feed(&body)?;
            if page.real_entries == 0 {
                empty_streak += 1;
                tracing::info!(
                    "Empty page for {} at offset {} ({}/{})",
                    topic.label,
                    start,
                    empty_streak,
                    self.settings.max_empty_pages
                );
                continue;
            }
            empty_streak = 0;
            start += page_size;

            let fresh: Vec<PaperRecord> = page
                .records
                .into_iter()
                .filter(|record| seen.insert(normalize_arxiv_id(&record.id)))
                .collect();
            tracing::debug!(
                "{} page {}: {} entries, {} unseen",
                topic.label,
                outcome.pages,
                page.real_entries,
                fresh.len()
            );

            let written = state.write(&fresh)?;
            outcome.written += written.appended;
            outcome.records.extend(fresh);

            if written.appended > 0 {
                tracing::info!(
                    "Appended {} papers ({} known)",
                    written.appended,
                    written.total_known
                );
                sleep(self.settings.write_delay).await;
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Period;
    use crate::sources::{atom_feed, MockEntry, MockFeedClient, MockResponse};
    use crate::store::{KnownIds, MetadataStore};
    use tempfile::TempDir;

    fn feed(ids: &[&str]) -> MockResponse {
        let entries: Vec<MockEntry> = ids
            .iter()
            .map(|id| MockEntry::new(id, &format!("Paper {}", id)))
            .collect();
        MockResponse::Feed(atom_feed(&entries))
    }

    fn settings(max_empty_pages: usize) -> HarvestSettings {
        HarvestSettings {
            max_empty_pages,
            ..HarvestSettings::immediate()
        }
    }

    fn run_state(dir: &TempDir, known: KnownIds) -> RunState {
        let store = MetadataStore::for_period(dir.path(), Period::new(2025, 8).unwrap());
        RunState::new(known, store.writer())
    }

    #[tokio::test]
    async fn test_first_occurrence_wins_within_topic() {
        let dir = TempDir::new().unwrap();
        let client = MockFeedClient::with_responses([
            feed(&["2508.00001v1", "2508.00002v1", "2508.00001v2"]),
            feed(&["2508.00002v3", "2508.00003v1"]),
        ]);
        let harvester = Harvester::new(client, settings(1));
        let mut state = run_state(&dir, KnownIds::new());

        let outcome = harvester
            .fetch_topic(&HarvestTopic::category("cs"), &mut state)
            .await
            .unwrap();

        let ids: Vec<&str> = outcome.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2508.00001", "2508.00002", "2508.00003"]);
        assert_eq!(outcome.written, 3);
        assert_eq!(outcome.pages, 3);
    }

    #[tokio::test]
    async fn test_empty_pages_retry_same_offset() {
        let dir = TempDir::new().unwrap();
        let client = MockFeedClient::with_responses([
            feed(&["2508.00001v1"]),
            feed(&[]),
            feed(&["2508.00002v1"]),
        ]);
        let harvester = Harvester::new(client, settings(3));
        let mut state = run_state(&dir, KnownIds::new());

        let outcome = harvester
            .fetch_topic(&HarvestTopic::category("cs"), &mut state)
            .await
            .unwrap();
        assert_eq!(outcome.records.len(), 2);

        let starts: Vec<usize> = harvester.client().requests().iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![0, 100, 100, 200, 200, 200]);
    }

    #[tokio::test]
    async fn test_target_limits_page_size() {
        let dir = TempDir::new().unwrap();
        let client = MockFeedClient::with_responses([feed(&["2508.00001v1"])]);
        let harvester = Harvester::new(client, settings(3));
        let mut state = run_state(&dir, KnownIds::new());

        let topic = HarvestTopic::category("cs").max_results(Some(30));
        harvester.fetch_topic(&topic, &mut state).await.unwrap();

        let requests = harvester.client().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_results, 30);
        assert_eq!(requests[0].query, "cat:cs*");
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let dir = TempDir::new().unwrap();
        let client = MockFeedClient::with_responses([
            MockResponse::Unavailable,
            MockResponse::Network,
            feed(&["2508.00001v1"]),
        ]);
        let harvester = Harvester::new(client, settings(1));
        let mut state = run_state(&dir, KnownIds::new());

        let outcome = harvester
            .fetch_topic(&HarvestTopic::category("cs"), &mut state)
            .await
            .unwrap();
        assert_eq!(outcome.written, 1);
    }

    #[tokio::test]
    async fn test_failed_topic_does_not_stop_run() {
        let dir = TempDir::new().unwrap();
        let client = MockFeedClient::with_responses([
            MockResponse::Status(400),
            feed(&["2508.00001v1"]),
        ]);
        let harvester = Harvester::new(client, settings(1));
        let mut state = run_state(&dir, KnownIds::new());

        let topics = vec![HarvestTopic::category("math"), HarvestTopic::category("cs")];
        let summary = harvester.harvest(&topics, &mut state).await.unwrap();

        assert_eq!(summary.failed, vec!["math"]);
        assert_eq!(summary.successful, vec!["cs"]);
        assert_eq!(summary.new_papers_count, 1);
        assert!(summary.topic_errors[0].1.contains("400"));
    }

    #[tokio::test]
    async fn test_later_topics_see_earlier_writes() {
        let dir = TempDir::new().unwrap();
        let client = MockFeedClient::with_responses([
            feed(&["2508.00001v1"]),
            feed(&[]),
            feed(&["2508.00001v1", "2508.00002v1"]),
        ]);
        let harvester = Harvester::new(client, settings(1));
        let mut state = run_state(&dir, KnownIds::new());

        let topics = vec![HarvestTopic::category("cs"), HarvestTopic::category("stat")];
        let summary = harvester.harvest(&topics, &mut state).await.unwrap();

        assert_eq!(summary.new_papers_count, 2);
        assert_eq!(
            summary.topic_paper_counts,
            vec![("cs".to_string(), 1), ("stat".to_string(), 2)]
        );
        assert_eq!(state.known().len(), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_keeps_earlier_pages() {
        let dir = TempDir::new().unwrap();
        let client = MockFeedClient::with_responses([
            feed(&["2508.00001v1", "2508.00002v1"]),
            MockResponse::Status(404),
        ]);
        let harvester = Harvester::new(client, settings(1));
        let mut state = run_state(&dir, KnownIds::new());

        let summary = harvester
            .harvest(&[HarvestTopic::category("cs")], &mut state)
            .await
            .unwrap();

        assert_eq!(summary.failed, vec!["cs"]);
        assert!(summary.successful.is_empty());
        assert_eq!(summary.new_papers_count, 2);
        assert!(summary.topic_errors[0].1.contains("404"));
        assert_eq!(harvester.client().requests().len(), 2);

        let path = dir.path().join("arxiv-metadata-oai-snapshot-202508.json");
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
