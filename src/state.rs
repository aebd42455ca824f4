//! Core data types shared across the aggregation pipeline.

use chrono::{DateTime, Utc};
use std::fmt;

/// A single normalized feed entry.
///
/// Produced by the normalizer from one raw scanned entry and stored in
/// category snapshots. The `link` is the identity key: two entries with the
/// same link are the same item regardless of any other field.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Human-readable headline.
    pub title: String,
    /// URL of the full content; identity key for deduplication.
    pub link: String,
    /// Publication timestamp when the source provided a parseable one.
    ///
    /// `None` means the source did not provide a usable date. The cache never
    /// substitutes the fetch time here; presentation layers may do so.
    pub published: Option<DateTime<Utc>>,
    /// Image URL carried by the feed itself, if any.
    pub image: Option<String>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.link == other.link
    }
}

impl Eq for Entry {}

/// One raw field value as it appeared in a feed document.
///
/// Feeds encode the same logical value in several shapes: plain element
/// text, a nested text node (CDATA), or an attribute on the element. The
/// scanner records which shape it saw; the normalizer only cares about the
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Plain element text, entities already decoded.
    PlainText(String),
    /// Text carried in a nested CDATA section.
    NestedText(String),
    /// Value carried by an attribute such as `href` or `url`.
    NestedAttribute(String),
}

impl FieldValue {
    /// Payload of the value, whatever shape it arrived in.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::PlainText(s) | Self::NestedText(s) | Self::NestedAttribute(s) => s,
        }
    }
}

/// One entry block scanned out of a feed document, fields still raw.
///
/// Channel-style (`<item>`) and feed-style (`<entry>`) blocks both collapse
/// into this shape; absent fields stay `None` and are resolved or dropped by
/// the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    /// Entry title in whichever encoding the document used.
    pub title: Option<FieldValue>,
    /// Entry link (element text or `href` attribute).
    pub link: Option<FieldValue>,
    /// Stable identifier, used as a link fallback.
    pub guid: Option<FieldValue>,
    /// Media image references in document order (string, object, or list
    /// encodings all flatten into this).
    pub media: Vec<FieldValue>,
    /// Enclosure URL, if the entry carried one.
    pub enclosure: Option<FieldValue>,
    /// Embedded HTML body, used for inline image discovery.
    pub content_html: Option<String>,
    /// Raw `pubDate` value.
    pub pub_date: Option<String>,
    /// Raw `published` value.
    pub published: Option<String>,
    /// Raw `updated` value.
    pub updated: Option<String>,
}

/// Error conditions surfaced by snapshot reads.
///
/// An unknown category must be distinguishable from a configured category
/// that currently has no entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The requested category is not present in the configuration.
    UnknownCategory(String),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCategory(name) => write!(f, "unknown category \"{name}\""),
        }
    }
}

impl std::error::Error for SnapshotError {}
