//! # arXiv Harvest
//!
//! Incremental harvester for arXiv paper metadata. Topics are paged through the
//! public arXiv query API and every paper not already on disk is appended to a
//! per-month JSON-lines snapshot, so repeated runs never write the same paper
//! twice.
//!
//! ## Architecture
//!
//! - [`models`]: Paper records, harvest topics, date ranges and periods
//! - [`sources`]: The feed client seam, the arXiv client and Atom parsing
//! - [`store`]: Snapshot files, the known-id set, loading, appending, compaction
//! - [`harvest`]: The paginated fetch loop and the full run pipeline
//! - [`report`]: The per-period markdown report
//! - [`probe`]: Reachability checks against the bulk-data bucket
//! - [`utils`]: ID normalization, HTTP client and retry policy
//! - [`config`]: Configuration management

pub mod config;
pub mod harvest;
pub mod models;
pub mod probe;
pub mod report;
pub mod sources;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use harvest::{run_pipeline, Harvester};
pub use models::PaperRecord;
pub use sources::{ArxivClient, FeedClient};
pub use store::MetadataStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
