//! Per-topic and per-run results.

use crate::models::PaperRecord;

/// Result of harvesting one topic
#[derive(Debug, Clone, Default)]
pub struct TopicOutcome {
    /// Distinct papers returned for the topic, first occurrence first
    pub records: Vec<PaperRecord>,

    /// How many of them were appended to the store
    pub written: usize,

    /// Pages requested
    pub pages: usize,
}

/// Aggregated statistics of a run, consumed by the report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Papers appended to the store during the run
    pub new_papers_count: usize,

    /// Topic labels processed, in order
    pub topics: Vec<String>,

    pub successful: Vec<String>,

    pub failed: Vec<String>,

    /// Distinct papers returned per successful topic
    pub topic_paper_counts: Vec<(String, usize)>,

    /// Error text per failed topic
    pub topic_errors: Vec<(String, String)>,
}

impl RunSummary {
    pub fn record_success(&mut self, label: &str, outcome: &TopicOutcome) {
        self.topics.push(label.to_string());
        self.successful.push(label.to_string());
        self.topic_paper_counts
            .push((label.to_string(), outcome.records.len()));
    }

    pub fn record_failure(&mut self, label: &str, error: impl ToString) {
        self.topics.push(label.to_string());
        self.failed.push(label.to_string());
        self.topic_errors.push((label.to_string(), error.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_bookkeeping() {
        let mut summary = RunSummary::default();
        summary.record_success("cs", &TopicOutcome::default());
        summary.record_failure("math", "HTTP error: 400 Bad Request");

        assert_eq!(summary.topics, vec!["cs", "math"]);
        assert_eq!(summary.successful, vec!["cs"]);
        assert_eq!(summary.failed, vec!["math"]);
        assert_eq!(summary.topic_paper_counts, vec![("cs".to_string(), 0)]);
        assert_eq!(
            summary.topic_errors,
            vec![("math".to_string(), "HTTP error: 400 Bad Request".to_string())]
        );
    }
}
