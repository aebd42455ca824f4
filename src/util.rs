//! Lightweight text-extraction and date-parsing helpers for feed scanning.
//!
//! The functions in this module are intentionally dependency-free string
//! scanners used on hot parsing paths; anything heavier (full HTML parsing)
//! lives behind `scraper` in the sources modules.

use chrono::{DateTime, NaiveDateTime, Utc};

/// What: Return the substring strictly between `start` and `end` markers.
///
/// Input: `s` source text; `start` opening marker; `end` closing marker
/// Output: `Some(String)` of enclosed content; `None` if markers are missing
#[must_use]
pub fn extract_between(s: &str, start: &str, end: &str) -> Option<String> {
    let i = s.find(start)? + start.len();
    let j = s[i..].find(end)? + i;
    Some(s[i..j].to_string())
}

/// What: Extract a quoted attribute value from a tag's attribute text.
///
/// Inputs:
/// - `attrs`: attribute portion of a tag, e.g. `url="http://a" type="image"`
/// - `name`: attribute name to look up
///
/// Output: `Some(String)` with the decoded value; `None` when the attribute
/// is absent or unquoted.
///
/// Details: matches the attribute name only at a token boundary so that
/// `url` does not match `xml:url`-style prefixed names by accident.
#[must_use]
pub fn extract_attr(attrs: &str, name: &str) -> Option<String> {
    let bytes = attrs.as_bytes();
    let mut pos = 0;
    while let Some(found) = attrs[pos..].find(name) {
        let at = pos + found;
        pos = at + name.len();
        let boundary = at == 0
            || matches!(bytes[at - 1], b' ' | b'\t' | b'\n' | b'\r' | b'"' | b'\'');
        if !boundary {
            continue;
        }
        let rest = attrs[at + name.len()..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();
        let quote = rest.chars().next()?;
        if quote != '"' && quote != '\'' {
            continue;
        }
        let value = &rest[1..];
        let close = value.find(quote)?;
        return Some(decode_entities(&value[..close]));
    }
    None
}

/// Return the interior of a `<![CDATA[...]]>` section, or `None` when the
/// text is not CDATA-wrapped.
#[must_use]
pub fn strip_cdata(s: &str) -> Option<String> {
    let inner = s.trim().strip_prefix("<![CDATA[")?;
    let inner = inner.strip_suffix("]]>").unwrap_or(inner);
    Some(inner.to_string())
}

/// Decode the handful of XML entities that matter for titles and URLs.
#[must_use]
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// What: Parse a feed date string into a UTC timestamp.
///
/// Input: `s` raw date text from a `pubDate`/`published`/`updated` field
/// Output: `Some(DateTime<Utc>)` on success; `None` when no known format
/// matches
///
/// Details: tries RFC 2822 (channel-style feeds), then RFC 3339 (feed-style
/// documents), then a bare ISO 8601 form without timezone, which is taken
/// as UTC.
#[must_use]
pub fn parse_feed_date(s: &str) -> Option<DateTime<Utc>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_between_returns_enclosed_content() {
        assert_eq!(
            extract_between("<a>hello</a>", "<a>", "</a>").as_deref(),
            Some("hello")
        );
        assert_eq!(extract_between("<a>hello", "<a>", "</a>"), None);
        assert_eq!(extract_between("hello</a>", "<a>", "</a>"), None);
    }

    #[test]
    fn extract_attr_handles_both_quote_styles() {
        let attrs = r#"url="http://a/img.png" type='image/png'"#;
        assert_eq!(extract_attr(attrs, "url").as_deref(), Some("http://a/img.png"));
        assert_eq!(extract_attr(attrs, "type").as_deref(), Some("image/png"));
        assert_eq!(extract_attr(attrs, "href"), None);
    }

    #[test]
    fn extract_attr_requires_a_token_boundary() {
        let attrs = r#"data-url="nope" url="yes""#;
        assert_eq!(extract_attr(attrs, "url").as_deref(), Some("yes"));
    }

    #[test]
    fn extract_attr_decodes_entities_in_values() {
        let attrs = r#"href="http://a/?x=1&amp;y=2""#;
        assert_eq!(extract_attr(attrs, "href").as_deref(), Some("http://a/?x=1&y=2"));
    }

    #[test]
    fn strip_cdata_unwraps_sections() {
        assert_eq!(
            strip_cdata("<![CDATA[Hello <b>x</b>]]>").as_deref(),
            Some("Hello <b>x</b>")
        );
        assert_eq!(strip_cdata("plain text"), None);
    }

    #[test]
    fn decode_entities_covers_the_common_set() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_entities("untouched"), "untouched");
    }

    #[test]
    fn parse_feed_date_accepts_rfc2822() {
        let dt = parse_feed_date("Mon, 01 Jan 2024 12:30:00 +0000");
        assert_eq!(
            dt.map(|d| d.to_rfc3339()),
            Some("2024-01-01T12:30:00+00:00".to_string())
        );
    }

    #[test]
    fn parse_feed_date_accepts_rfc3339() {
        assert!(parse_feed_date("2024-06-15T08:00:00Z").is_some());
        assert!(parse_feed_date("2024-06-15T08:00:00+02:00").is_some());
    }

    #[test]
    fn parse_feed_date_accepts_bare_iso_as_utc() {
        let dt = parse_feed_date("2024-06-15T08:00:00");
        assert_eq!(
            dt.map(|d| d.to_rfc3339()),
            Some("2024-06-15T08:00:00+00:00".to_string())
        );
    }

    #[test]
    fn parse_feed_date_rejects_garbage() {
        assert_eq!(parse_feed_date("not-a-real-date"), None);
        assert_eq!(parse_feed_date("   "), None);
    }
}
