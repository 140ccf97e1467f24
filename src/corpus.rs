//! Documents and the crawl-result file they are loaded from.
//!
//! A [`Corpus`] is the ordered input of a clustering session. Order matters:
//! every label assignment is aligned by position to the documents here.
//!
//! The crawler persists its results as JSON:
//!
//! ```text
//! {
//!   "fetched_at": "2021-05-01T10:00:00Z",
//!   "news": [
//!     { "authors": ["..."], "title": "...", "published_at": null, "contents": "..." }
//!   ]
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One crawled article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Bylines, in page order.
    #[serde(default)]
    pub authors: Vec<String>,
    /// Headline.
    pub title: String,
    /// Publication time, when the page exposes one.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Extracted body text.
    pub contents: String,
}

impl Document {
    /// Document with only a title and body.
    pub fn new(title: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            authors: Vec::new(),
            title: title.into(),
            published_at: None,
            contents: contents.into(),
        }
    }

    /// Set the authors.
    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    /// Set the publication time.
    pub fn with_published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }
}

/// The file-store record written by the crawler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRecord {
    /// When the crawl finished.
    pub fetched_at: DateTime<Utc>,
    /// Crawled articles, in crawl order.
    pub news: Vec<Document>,
}

/// Ordered, immutable sequence of documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    documents: Vec<Document>,
    fetched_at: Option<DateTime<Utc>>,
}

impl Corpus {
    /// Wrap documents in crawl order.
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            fetched_at: None,
        }
    }

    /// Read a [`CrawlRecord`] from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let record: CrawlRecord = serde_json::from_reader(reader)?;
        Ok(Self::from(record))
    }

    /// Read a [`CrawlRecord`] from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Keep only the first `limit` documents.
    pub fn truncate(mut self, limit: usize) -> Self {
        self.documents.truncate(limit);
        self
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether there are no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents, in order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Body texts, in document order.
    pub fn texts(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.contents.as_str()).collect()
    }

    /// Crawl time, if the corpus was loaded from a crawl record.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }
}

impl From<CrawlRecord> for Corpus {
    fn from(record: CrawlRecord) -> Self {
        Self {
            documents: record.news,
            fetched_at: Some(record.fetched_at),
        }
    }
}

impl FromIterator<Document> for Corpus {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
