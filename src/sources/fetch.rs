//! Feed document retrieval and raw entry scanning.
//!
//! Documents are scanned iteratively by tag markers rather than through a
//! full XML parse: feed markup in the wild is frequently malformed, and the
//! handful of fields we extract tolerate that better than a strict parser.

use tracing::{info, warn};

use super::{FEED_TIMEOUT, HTTP_CLIENT, Result};
use crate::state::{Entry, FieldValue, RawEntry};
use crate::util::{decode_entities, extract_attr, strip_cdata};

/// What: Fetch one feed source and return its normalized entries.
///
/// Inputs:
/// - `url`: feed location
///
/// Output: normalized entries; empty on any failure (network error, timeout,
/// HTTP error, unknown document shape).
///
/// Details: a failing source never aborts the caller's aggregation run; the
/// failure is logged and an empty list returned.
pub async fn fetch_entries(url: &str) -> Vec<Entry> {
    match fetch_document(url).await {
        Ok(body) => {
            let entries: Vec<Entry> = scan_feed_document(&body)
                .iter()
                .filter_map(crate::sources::normalize_entry)
                .collect();
            info!(url, count = entries.len(), "fetched feed");
            entries
        }
        Err(e) => {
            warn!(url, error = %e, "feed fetch failed; continuing without this source");
            Vec::new()
        }
    }
}

/// Retrieve a feed document body with the bounded feed timeout.
async fn fetch_document(url: &str) -> Result<String> {
    let response = HTTP_CLIENT.get(url).timeout(FEED_TIMEOUT).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP error: {status}").into());
    }
    Ok(response.text().await?)
}

/// What: Scan a feed document into raw entries.
///
/// Inputs:
/// - `body`: full document text
///
/// Output: one [`RawEntry`] per `<item>` block, falling back to `<entry>`
/// blocks for feed-style documents; empty for unknown shapes.
#[must_use]
pub fn scan_feed_document(body: &str) -> Vec<RawEntry> {
    let items = scan_blocks(body, "item");
    if items.is_empty() {
        scan_blocks(body, "entry")
    } else {
        items
    }
}

/// Collect every `<name>…</name>` block in document order.
fn scan_blocks(body: &str, name: &str) -> Vec<RawEntry> {
    let open = format!("<{name}");
    let close = format!("</{name}>");
    let mut blocks = Vec::new();
    let mut pos = 0;
    while let Some(found) = body[pos..].find(&open) {
        let start = pos + found;
        let after = start + open.len();
        // Require a real tag boundary so `<item` does not match `<itemref`.
        let boundary = matches!(
            body[after..].chars().next(),
            Some(c) if c == '>' || c.is_ascii_whitespace()
        );
        if !boundary {
            pos = after;
            continue;
        }
        let end = body[start..]
            .find(&close)
            .map_or(body.len(), |e| start + e + close.len());
        blocks.push(scan_entry_block(&body[start..end]));
        pos = end;
    }
    blocks
}

/// Scan one entry block into its raw fields.
fn scan_entry_block(block: &str) -> RawEntry {
    RawEntry {
        title: element_field(block, "title", &[]),
        link: element_field(block, "link", &["href"]),
        guid: element_field(block, "guid", &[])
            .or_else(|| element_field(block, "id", &[])),
        media: media_fields(block),
        enclosure: element_field(block, "enclosure", &["url"]),
        content_html: first_body(block),
        pub_date: element_text(block, "pubDate"),
        published: element_text(block, "published"),
        updated: element_text(block, "updated"),
    }
}

/// All occurrences of `<name …>` in a block: `(attribute text, inner text)`,
/// inner `None` for self-closing tags.
fn elements(block: &str, name: &str) -> Vec<(String, Option<String>)> {
    let open = format!("<{name}");
    let close = format!("</{name}>");
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(found) = block[pos..].find(&open) {
        let start = pos + found;
        let after = start + open.len();
        let boundary = matches!(
            block[after..].chars().next(),
            Some(c) if c == '>' || c == '/' || c.is_ascii_whitespace()
        );
        if !boundary {
            pos = after;
            continue;
        }
        let Some(gt) = block[after..].find('>') else {
            break;
        };
        let tag_end = after + gt;
        let attrs = block[after..tag_end]
            .trim()
            .trim_end_matches('/')
            .trim()
            .to_string();
        if block[..tag_end].ends_with('/') {
            out.push((attrs, None));
            pos = tag_end + 1;
            continue;
        }
        let content_start = tag_end + 1;
        match block[content_start..].find(&close) {
            Some(e) => {
                out.push((attrs, Some(block[content_start..content_start + e].to_string())));
                pos = content_start + e + close.len();
            }
            None => {
                out.push((attrs, None));
                pos = content_start;
            }
        }
    }
    out
}

/// First occurrence of `<name …>` in a block.
fn element(block: &str, name: &str) -> Option<(String, Option<String>)> {
    elements(block, name).into_iter().next()
}

/// Resolve one element into a [`FieldValue`], preferring the listed
/// attributes over element text, and CDATA over plain text.
fn field_value(attrs: &str, inner: Option<&str>, attr_names: &[&str]) -> Option<FieldValue> {
    for attr in attr_names {
        if let Some(value) = extract_attr(attrs, attr)
            && !value.is_empty()
        {
            return Some(FieldValue::NestedAttribute(value));
        }
    }
    let text = inner?.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(cdata) = strip_cdata(text) {
        let cdata = cdata.trim().to_string();
        if cdata.is_empty() {
            None
        } else {
            Some(FieldValue::NestedText(cdata))
        }
    } else {
        Some(FieldValue::PlainText(decode_entities(text)))
    }
}

/// First `<name>` element resolved into a [`FieldValue`].
fn element_field(block: &str, name: &str, attr_names: &[&str]) -> Option<FieldValue> {
    let (attrs, inner) = element(block, name)?;
    field_value(&attrs, inner.as_deref(), attr_names)
}

/// Plain text of the first `<name>` element.
fn element_text(block: &str, name: &str) -> Option<String> {
    let (_, inner) = element(block, name)?;
    let text = inner?.trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}

/// Media image references in document order. `media:content` elements take
/// precedence over `media:thumbnail`; each may carry the URL as an attribute
/// or as element text, and may repeat (list encoding).
fn media_fields(block: &str) -> Vec<FieldValue> {
    let mut out = Vec::new();
    for name in ["media:content", "media:thumbnail"] {
        for (attrs, inner) in elements(block, name) {
            if let Some(value) = field_value(&attrs, inner.as_deref(), &["url"]) {
                out.push(value);
            }
        }
    }
    out
}

/// Embedded HTML body of the entry, first of `content:encoded`, `content`,
/// `description`. CDATA sections are unwrapped; otherwise entities are
/// decoded so inline markup becomes scannable.
fn first_body(block: &str) -> Option<String> {
    for name in ["content:encoded", "content", "description"] {
        if let Some((_, Some(inner))) = element(block, name) {
            let text = inner.trim();
            if text.is_empty() {
                continue;
            }
            let html = strip_cdata(text).unwrap_or_else(|| decode_entities(text));
            return Some(html);
        }
    }
    None
}
