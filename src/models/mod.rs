//! Core data models for harvested papers and harvest runs.

mod paper;
mod query;

pub use paper::{AuthorName, ParsedAuthor, PaperRecord, PaperRecordBuilder};
pub use query::{
    DateRange, DateRangeError, HarvestTopic, Period, DATE_RANGE_TOPIC, MAIN_CATEGORIES,
};
