//! Harvest topics, date ranges and store periods.

use chrono::{Datelike, Local, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Main arXiv archives harvested when no explicit topic is given
pub const MAIN_CATEGORIES: &[&str] = &[
    "astro-ph", "cond-mat", "gr-qc", "hep-ex", "hep-lat", "hep-ph", "hep-th", "math-ph", "nlin",
    "nucl-ex", "nucl-th", "physics", "quant-ph", "math", "cs", "q-bio", "q-fin", "stat", "eess",
    "econ",
];

/// Topic label used for the single date-range harvest
pub const DATE_RANGE_TOPIC: &str = "date_range";

/// Inclusive submission date range (`YYYY-MM-DD,YYYY-MM-DD` on the command line)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// arXiv search clause restricting results to the range
    pub fn to_query_clause(&self) -> String {
        format!(
            "submittedDate:[{} TO {}]",
            self.start.format("%Y%m%d"),
            self.end.format("%Y%m%d")
        )
    }
}

/// Errors produced when parsing a date range argument
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("expected START,END but got '{0}'")]
    Shape(String),

    #[error("invalid {which} date '{value}', expected YYYY-MM-DD")]
    Date { which: &'static str, value: String },
}

impl FromStr for DateRange {
    type Err = DateRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once(',')
            .ok_or_else(|| DateRangeError::Shape(s.to_string()))?;
        let parse = |which: &'static str, value: &str| {
            let value = value.trim();
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| DateRangeError::Date {
                which,
                value: value.to_string(),
            })
        };
        Ok(Self {
            start: parse("start", start)?,
            end: parse("end", end)?,
        })
    }
}

/// One harvest unit: a label plus the arXiv search expression to page through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestTopic {
    /// Label used in logs and the report
    pub label: String,

    /// arXiv `search_query` expression
    pub query: String,

    /// Maximum number of results; `None` pages until the feed runs dry
    pub max_results: Option<usize>,
}

impl HarvestTopic {
    pub fn new(label: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            query: query.into(),
            max_results: None,
        }
    }

    /// Topic covering every paper in one archive, e.g. `cat:cs*`
    pub fn category(archive: &str) -> Self {
        Self::new(archive, format!("cat:{}*", archive))
    }

    /// Topic covering everything submitted within `range`
    pub fn date_range(range: DateRange) -> Self {
        Self::new(DATE_RANGE_TOPIC, String::new()).within(range)
    }

    pub fn max_results(mut self, max: Option<usize>) -> Self {
        self.max_results = max;
        self
    }

    /// Restrict the query to a submission date range
    pub fn within(mut self, range: DateRange) -> Self {
        let clause = range.to_query_clause();
        self.query = if self.query.is_empty() {
            clause
        } else {
            format!("{} AND {}", self.query, clause)
        };
        self
    }
}

/// Year and month a store or report file belongs to, rendered as `YYYYMM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Period of the local wall clock
    pub fn current() -> Self {
        let now = Local::now();
        Self {
            year: now.year(),
            month: now.month(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("period must be six digits (YYYYMM): '{}'", s));
        }
        let year: i32 = s[..4].parse().map_err(|e| format!("{}", e))?;
        let month: u32 = s[4..].parse().map_err(|e| format!("{}", e))?;
        Period::new(year, month).ok_or_else(|| format!("month out of range: '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_range() {
        let range: DateRange = "2025-08-01, 2025-08-31".parse().unwrap();
        assert_eq!(range.to_query_clause(), "submittedDate:[20250801 TO 20250831]");
    }

    #[test]
    fn test_parse_date_range_errors() {
        assert_eq!(
            "2025-08-01".parse::<DateRange>(),
            Err(DateRangeError::Shape("2025-08-01".to_string()))
        );
        assert!(matches!(
            "2025-13-01,2025-08-31".parse::<DateRange>(),
            Err(DateRangeError::Date { which: "start", .. })
        ));
        assert!(matches!(
            "2025-08-01,yesterday".parse::<DateRange>(),
            Err(DateRangeError::Date { which: "end", .. })
        ));
    }

    #[test]
    fn test_topic_queries() {
        assert_eq!(HarvestTopic::category("cs").query, "cat:cs*");

        let range: DateRange = "2025-08-01,2025-08-02".parse().unwrap();
        let dated = HarvestTopic::date_range(range);
        assert_eq!(dated.label, DATE_RANGE_TOPIC);
        assert_eq!(dated.query, "submittedDate:[20250801 TO 20250802]");

        let combined = HarvestTopic::category("math").within(range);
        assert_eq!(
            combined.query,
            "cat:math* AND submittedDate:[20250801 TO 20250802]"
        );
    }

    #[test]
    fn test_period_roundtrip_and_order() {
        let p: Period = "202508".parse().unwrap();
        assert_eq!(p.to_string(), "202508");
        assert!(Period::new(2025, 7).unwrap() < p);
        assert!("202513".parse::<Period>().is_err());
        assert!("2025-8".parse::<Period>().is_err());
    }

    #[test]
    fn test_main_categories() {
        assert_eq!(MAIN_CATEGORIES.len(), 20);
        assert!(MAIN_CATEGORIES.contains(&"cs"));
    }
}
