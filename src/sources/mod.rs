//! Feed sources the harvester pages through.
//!
//! The [`FeedClient`] trait is the seam between the paginated fetch loop and
//! the network: an implementation performs exactly one page request and returns
//! the raw Atom body. Retries, parsing and deduplication live in the caller.
//!
//! - [`ArxivClient`]: the public arXiv query API over HTTP
//! - [`MockFeedClient`]: scripted responses for tests

mod arxiv;
pub mod mock;

pub use arxiv::{parse_feed, ArxivClient, FeedPage, ARXIV_API_URL};
pub use mock::{atom_feed, MockEntry, MockFeedClient, MockResponse};

use async_trait::async_trait;

/// One page of a paginated search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Search expression in the API's filter syntax
    pub query: String,

    /// Zero-based offset of the first result
    pub start: usize,

    /// Page size
    pub max_results: usize,
}

impl PageRequest {
    pub fn new(query: impl Into<String>, start: usize, max_results: usize) -> Self {
        Self {
            query: query.into(),
            start,
            max_results,
        }
    }
}

/// A client able to fetch one page of search results.
#[async_trait]
pub trait FeedClient: Send + Sync + std::fmt::Debug {
    /// Human-readable name of the feed
    fn name(&self) -> &str;

    /// Fetch the raw feed body for one page. Implementations do not retry.
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<u8>, SourceError>;
}

/// Errors that can occur when talking to a feed
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Connection or transport failure before a status was received
    #[error("Network error: {0}")]
    Network(String),

    /// The server reported 503 Service Unavailable
    #[error("Service unavailable (HTTP 503)")]
    ServiceUnavailable,

    /// Any other non-success status
    #[error("HTTP error: {status} {reason}")]
    Http { status: u16, reason: String },

    /// The body could not be parsed as a feed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SourceError::Http {
            status: 400,
            reason: "Bad Request".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error: 400 Bad Request");
        assert_eq!(
            SourceError::ServiceUnavailable.to_string(),
            "Service unavailable (HTTP 503)"
        );
    }
}
