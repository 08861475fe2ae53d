//! Paginated harvesting of arXiv topics into the snapshot store.
//!
//! A run walks a list of [`HarvestTopic`]s in order. For each topic the
//! [`Harvester`] pages through search results, drops papers it has already seen
//! in this topic, and flushes every page's new papers through the run's
//! [`RunState`] before requesting the next page. The run state owns the
//! known-id set and the snapshot writer, so later topics see the writes of
//! earlier ones.
//!
//! [`HarvestTopic`]: crate::models::HarvestTopic

mod fetcher;
mod pipeline;
mod summary;

pub use fetcher::Harvester;
pub use pipeline::{plan_topics, run_pipeline, RunOptions, RunOutcome};
pub use summary::{RunSummary, TopicOutcome};

use std::time::Duration;

use crate::models::PaperRecord;
use crate::sources::SourceError;
use crate::store::{KnownIds, SnapshotWriter, StoreError, WriteOutcome};
use crate::utils::RetryPolicy;

/// Errors that end a topic or a whole run
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl HarvestError {
    /// Store failures end the run; source failures only end the topic.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HarvestError::Store(_))
    }
}

/// Paging and pacing parameters
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestSettings {
    /// Results requested per page
    pub page_size: usize,

    /// Consecutive empty pages that end a topic
    pub max_empty_pages: usize,

    /// Pause before every page request
    pub page_delay: Duration,

    /// Pause after a page that appended records
    pub write_delay: Duration,

    pub retry: RetryPolicy,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_empty_pages: 3,
            page_delay: Duration::from_secs(5),
            write_delay: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

impl HarvestSettings {
    /// Settings without any pacing or retry waits
    pub fn immediate() -> Self {
        Self {
            page_delay: Duration::ZERO,
            write_delay: Duration::ZERO,
            retry: RetryPolicy::immediate(RetryPolicy::default().max_attempts),
            ..Self::default()
        }
    }
}

/// Mutable state carried across every topic of one run
#[derive(Debug)]
pub struct RunState {
    known: KnownIds,
    writer: SnapshotWriter,
    written: usize,
}

impl RunState {
    pub fn new(known: KnownIds, writer: SnapshotWriter) -> Self {
        Self {
            known,
            writer,
            written: 0,
        }
    }

    /// Canonical ids persisted so far, including this run's writes
    pub fn known(&self) -> &KnownIds {
        &self.known
    }

    /// Records appended during this run
    pub fn written(&self) -> usize {
        self.written
    }

    /// Hand one page of records to the writer
    pub fn write(&mut self, records: &[PaperRecord]) -> Result<WriteOutcome, StoreError> {
        let outcome = self.writer.write_batch(records, &mut self.known)?;
        self.written += outcome.appended;
        Ok(outcome)
    }

    pub fn into_known(self) -> KnownIds {
        self.known
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_fatality() {
        let source = HarvestError::from(SourceError::ServiceUnavailable);
        assert!(!source.is_fatal());

        let store = HarvestError::from(StoreError::Io {
            path: PathBuf::from("/data/snapshot.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        });
        assert!(store.is_fatal());
        assert!(store.to_string().contains("/data/snapshot.json"));
    }

    #[test]
    fn test_immediate_settings() {
        let settings = HarvestSettings::immediate();
        assert_eq!(settings.page_size, 100);
        assert_eq!(settings.max_empty_pages, 3);
        assert_eq!(settings.page_delay, Duration::ZERO);
        assert_eq!(settings.retry.max_attempts, 5);
    }
}
