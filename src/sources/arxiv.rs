//! arXiv query API client and Atom feed parsing.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::StatusCode;

use crate::models::{AuthorName, PaperRecord, PaperRecordBuilder};
use crate::sources::{FeedClient, PageRequest, SourceError};
use crate::utils::{normalize_arxiv_id, HttpClient};

/// Base URL for arXiv API
pub const ARXIV_API_URL: &str = "https://export.arxiv.org/api/query";

/// arXiv query API client
#[derive(Debug, Clone)]
pub struct ArxivClient {
    client: HttpClient,
    api_url: String,
}

impl ArxivClient {
    /// Create a client for the public arXiv API
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(HttpClient::new()?, ARXIV_API_URL))
    }

    /// Create with a custom HTTP client and endpoint (for testing)
    pub fn with_client(client: HttpClient, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    /// Full request URL for one page, newest submissions first
    pub fn page_url(&self, request: &PageRequest) -> String {
        format!(
            "{}?search_query={}&sortBy=submittedDate&sortOrder=descending&start={}&max_results={}",
            self.api_url,
            urlencoding::encode(&request.query),
            request.start,
            request.max_results
        )
    }
}

#[async_trait]
impl FeedClient for ArxivClient {
    fn name(&self) -> &str {
        "arXiv"
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<u8>, SourceError> {
        let url = self.page_url(request);
        tracing::debug!("Requesting {}", url);

        let response = self
            .client
            .client()
            .get(&url)
            .header("Accept", "application/atom+xml")
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch arXiv results: {}", e)))?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(SourceError::ServiceUnavailable);
        }
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;

        Ok(bytes.to_vec())
    }
}

/// Paper entries parsed out of one feed page
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    /// Entries that are papers rather than search metadata, including ones
    /// that lacked the fields needed to build a record
    pub real_entries: usize,

    /// Records in feed order
    pub records: Vec<PaperRecord>,
}

/// Parse an arXiv Atom response body into paper records.
///
/// Entries without an `<id>` are counted as real entries but produce no record.
/// Dates keep the calendar day written in the feed, whatever its UTC offset.
pub fn parse_feed(body: &[u8]) -> Result<FeedPage, SourceError> {
    let feed = parser::Builder::new()
        .id_generator(|_, _, _| String::new())
        .timestamp_parser(parse_local_timestamp)
        .build()
        .parse(body)
        .map_err(|e| SourceError::Parse(format!("Failed to parse Atom feed: {}", e)))?;

    let mut page = FeedPage::default();
    for entry in &feed.entries {
        if is_search_info(entry) {
            continue;
        }
        page.real_entries += 1;

        match record_from_entry(entry) {
            Some(record) => page.records.push(record),
            None => tracing::debug!("Skipping entry without id or title: {:?}", entry.id),
        }
    }

    Ok(page)
}

/// Read a timestamp as the wall-clock time it states, dropping the offset, so
/// `2025-08-21T23:30:00-04:00` stays on `2025-08-21`.
fn parse_local_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .map(|d| d.naive_local().and_utc())
        .ok()
        .or_else(|| {
            let day = text.get(..10)?;
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .ok()?
                .and_hms_opt(0, 0, 0)
                .map(|d| d.and_utc())
        })
}

/// Entries describing the search itself rather than a paper
fn is_search_info(entry: &Entry) -> bool {
    entry
        .title
        .as_ref()
        .map(|t| {
            let title = t.content.to_lowercase();
            title.contains("title") && title.contains("result")
        })
        .unwrap_or(false)
}

fn record_from_entry(entry: &Entry) -> Option<PaperRecord> {
    let title = entry.title.as_ref()?;
    if entry.id.is_empty() {
        return None;
    }

    let authors = entry
        .authors
        .iter()
        .map(|a| AuthorName::new(a.name.as_str()))
        .collect();

    let categories = entry
        .categories
        .iter()
        .map(|c| c.term.clone())
        .filter(|t| !t.is_empty())
        .collect();

    let links = entry.links.iter().map(|l| l.href.clone()).collect();

    let abstract_text = entry
        .summary
        .as_ref()
        .map(|s| s.content.as_str())
        .unwrap_or("");

    let date = |d: Option<DateTime<Utc>>| {
        d.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };

    Some(
        PaperRecordBuilder::new(normalize_arxiv_id(&entry.id), title.content.as_str(), entry.id.as_str())
            .authors(authors)
            .abstract_text(abstract_text)
            .categories(categories)
            .publish_time(date(entry.published))
            .update_date(date(entry.updated))
            .links(links)
            .build(),
    )
}
