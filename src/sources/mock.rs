//! Scripted feed client for testing purposes.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::sources::{FeedClient, PageRequest, SourceError};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// A feed body returned with HTTP 200
    Feed(String),
    /// HTTP 503
    Unavailable,
    /// Any other HTTP status
    Status(u16),
    /// Connection failure
    Network,
}

/// A feed client that replays scripted responses in order and records every
/// request it receives. Once the script runs out it serves an empty feed.
#[derive(Debug, Default)]
pub struct MockFeedClient {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl MockFeedClient {
    /// Create a new mock client with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that serves the given responses in order.
    pub fn with_responses(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl FeedClient for MockFeedClient {
    fn name(&self) -> &str {
        "Mock Feed"
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<u8>, SourceError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let next = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match next {
            Some(MockResponse::Feed(body)) => Ok(body.into_bytes()),
            Some(MockResponse::Unavailable) => Err(SourceError::ServiceUnavailable),
            Some(MockResponse::Status(status)) => Err(SourceError::Http {
                status,
                reason: "mock".to_string(),
            }),
            Some(MockResponse::Network) => Err(SourceError::Network("mock connection reset".to_string())),
            None => Ok(atom_feed(&[]).into_bytes()),
        }
    }
}

/// A minimal arXiv-style entry for building mock feeds
#[derive(Debug, Clone)]
pub struct MockEntry {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub categories: Vec<String>,
}

impl MockEntry {
    /// Entry for `http://arxiv.org/abs/<versioned_id>`
    pub fn new(versioned_id: &str, title: &str) -> Self {
        Self {
            id: format!("http://arxiv.org/abs/{}", versioned_id),
            title: title.to_string(),
            authors: vec!["Test Author".to_string()],
            categories: vec!["cs.LG".to_string()],
        }
    }

    pub fn categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }
}

/// Render entries as an Atom feed body shaped like an arXiv API response.
pub fn atom_feed(entries: &[MockEntry]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <id>http://arxiv.org/api/query</id>
  <title type="html">ArXiv Query: mock</title>
  <updated>2025-08-20T00:00:00Z</updated>
"#,
    );
    for entry in entries {
        body.push_str("  <entry>\n");
        body.push_str(&format!("    <id>{}</id>\n", entry.id));
        body.push_str("    <updated>2025-08-02T10:00:00Z</updated>\n");
        body.push_str("    <published>2025-08-01T10:00:00Z</published>\n");
        body.push_str(&format!("    <title>{}</title>\n", entry.title));
        body.push_str("    <summary>Mock abstract\nspanning lines.</summary>\n");
        for author in &entry.authors {
            body.push_str(&format!("    <author><name>{}</name></author>\n", author));
        }
        for category in &entry.categories {
            body.push_str(&format!("    <category term=\"{}\"/>\n", category));
        }
        body.push_str(&format!(
            "    <link href=\"{}\" rel=\"alternate\" type=\"text/html\"/>\n",
            entry.id
        ));
        body.push_str("  </entry>\n");
    }
    body.push_str("</feed>\n");
    body
}
