//! Utility modules supporting harvest operations.
//!
//! - [`normalize_arxiv_id`]: Reduce any arXiv identifier form to its canonical key
//! - [`HttpClient`]: Shared reqwest client with the crate user agent
//! - [`RetryPolicy`]: Attempt ceiling and backoff used by [`with_retry`]
//! - [`with_retry`]: Execute a request with retries on transient failures
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use arxiv_harvest::sources::SourceError;
//! use arxiv_harvest::utils::{with_retry, RetryPolicy};
//!
//! # async fn fetch() -> Result<String, SourceError> { Ok("feed".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), SourceError> {
//! let body = with_retry(&RetryPolicy::default(), || fetch()).await?;
//! # Ok(())
//! # }
//! ```

mod http;
mod id;
mod retry;

pub use http::{HttpClient, USER_AGENT};
pub use id::normalize_arxiv_id;
pub use retry::{with_retry, Backoff, RetryPolicy, TransientError};
