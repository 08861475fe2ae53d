//! Paper record model persisted to the snapshot store.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single author as the feed reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorName {
    pub name: String,
}

impl AuthorName {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Split the display name into a `(last, first, middle)` triple.
    ///
    /// Names with fewer than two whitespace-separated tokens keep the whole
    /// name as the last name.
    pub fn parse(&self) -> ParsedAuthor {
        let parts: Vec<&str> = self.name.split_whitespace().collect();
        if parts.len() >= 2 {
            ParsedAuthor {
                last: parts[parts.len() - 1].to_string(),
                first: parts[0].to_string(),
                middle: parts[1..parts.len() - 1].join(" "),
            }
        } else {
            ParsedAuthor {
                last: self.name.clone(),
                first: String::new(),
                middle: String::new(),
            }
        }
    }
}

/// `(last, first, middle)` name triple, serialized as a three element array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[String; 3]", into = "[String; 3]")]
pub struct ParsedAuthor {
    pub last: String,
    pub first: String,
    pub middle: String,
}

impl From<[String; 3]> for ParsedAuthor {
    fn from([last, first, middle]: [String; 3]) -> Self {
        Self {
            last,
            first,
            middle,
        }
    }
}

impl From<ParsedAuthor> for [String; 3] {
    fn from(author: ParsedAuthor) -> Self {
        [author.last, author.first, author.middle]
    }
}

/// One harvested metadata entry.
///
/// Field order matches the arXiv metadata snapshot layout, so serialized lines
/// can be mixed with records from the public snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Canonical identifier (version and URL prefix stripped)
    pub id: String,

    /// Authors in feed order, persisted as a `", "` joined string
    #[serde(with = "author_list", default)]
    pub authors: Vec<AuthorName>,

    pub title: String,

    #[serde(default)]
    pub comments: Option<String>,

    #[serde(rename = "journal-ref", default)]
    pub journal_ref: Option<String>,

    #[serde(default)]
    pub doi: Option<String>,

    #[serde(default)]
    pub categories: Vec<String>,

    /// Abstract with newlines collapsed to spaces
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,

    /// Last updated date (`YYYY-MM-DD`) or empty
    #[serde(default)]
    pub update_date: String,

    #[serde(default)]
    pub authors_parsed: Vec<ParsedAuthor>,

    #[serde(default)]
    pub primary_category: Option<String>,

    /// First published date (`YYYY-MM-DD`) or empty
    #[serde(default)]
    pub publish_time: String,

    /// Identifier exactly as the feed reported it
    #[serde(default)]
    pub entry_id: String,

    #[serde(default)]
    pub links: Vec<String>,
}

impl PaperRecord {
    /// Comma separated author names, as stored on disk
    pub fn author_line(&self) -> String {
        join_authors(&self.authors)
    }
}

fn join_authors(authors: &[AuthorName]) -> String {
    authors
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builder for constructing [`PaperRecord`] values from feed entries
#[derive(Debug, Clone)]
pub struct PaperRecordBuilder {
    record: PaperRecord,
}

impl PaperRecordBuilder {
    pub fn new(id: impl Into<String>, title: impl Into<String>, entry_id: impl Into<String>) -> Self {
        Self {
            record: PaperRecord {
                id: id.into(),
                authors: Vec::new(),
                title: title.into(),
                comments: None,
                journal_ref: None,
                doi: None,
                categories: Vec::new(),
                abstract_text: String::new(),
                update_date: String::new(),
                authors_parsed: Vec::new(),
                primary_category: None,
                publish_time: String::new(),
                entry_id: entry_id.into(),
                links: Vec::new(),
            },
        }
    }

    /// Set the authors; also derives `authors_parsed`
    pub fn authors(mut self, authors: Vec<AuthorName>) -> Self {
        self.record.authors_parsed = authors.iter().map(AuthorName::parse).collect();
        self.record.authors = authors;
        self
    }

    /// Set the abstract, collapsing embedded newlines
    pub fn abstract_text(mut self, text: &str) -> Self {
        self.record.abstract_text = text.replace('\n', " ");
        self
    }

    /// Set the categories; the first becomes the primary category
    pub fn categories(mut self, categories: Vec<String>) -> Self {
        self.record.primary_category = categories.first().cloned();
        self.record.categories = categories;
        self
    }

    pub fn publish_time(mut self, date: impl Into<String>) -> Self {
        self.record.publish_time = date.into();
        self
    }

    pub fn update_date(mut self, date: impl Into<String>) -> Self {
        self.record.update_date = date.into();
        self
    }

    pub fn links(mut self, links: Vec<String>) -> Self {
        self.record.links = links;
        self
    }

    pub fn build(self) -> PaperRecord {
        self.record
    }
}

/// Authors are written as one joined string but older stores may hold arrays.
mod author_list {
    use super::*;

    pub fn serialize<S>(authors: &[AuthorName], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&join_authors(authors))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Joined(String),
        List(Vec<String>),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<AuthorName>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let names = match Option::<Stored>::deserialize(deserializer)? {
            Some(Stored::Joined(joined)) => joined
                .split(", ")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Some(Stored::List(list)) => list,
            None => Vec::new(),
        };
        Ok(names.into_iter().map(AuthorName::new).collect())
    }
}
