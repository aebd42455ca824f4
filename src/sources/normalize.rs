//! Normalization of raw scanned entries into canonical [`Entry`] records.

use scraper::{Html, Selector};

use crate::state::{Entry, FieldValue, RawEntry};
use crate::util::parse_feed_date;

/// What: Convert one raw scanned entry into a canonical record.
///
/// Inputs:
/// - `raw`: scanned entry with fields still in their document encodings
///
/// Output: `Some(Entry)` when both a title and a link could be resolved;
/// `None` otherwise (the entry is dropped).
///
/// Details:
/// - The link falls back to the entry's `guid` when no link field is usable.
/// - Image precedence: media reference, then enclosure, then the first
///   inline `<img>` of the embedded HTML body, then none.
/// - The publish time is the first parseable of `pubDate`, `published`,
///   `updated`; unparseable dates leave it unset rather than guessing.
#[must_use]
pub fn normalize_entry(raw: &RawEntry) -> Option<Entry> {
    let title = field_text(raw.title.as_ref())?;
    let link = field_text(raw.link.as_ref()).or_else(|| field_text(raw.guid.as_ref()))?;
    let published = [
        raw.pub_date.as_deref(),
        raw.published.as_deref(),
        raw.updated.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find_map(parse_feed_date);
    let image = pick_image(raw);
    Some(Entry {
        title,
        link,
        published,
        image,
    })
}

/// Trimmed payload of an optional field value, `None` when empty.
fn field_text(field: Option<&FieldValue>) -> Option<String> {
    let text = field?.as_str().trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Select the entry image following the media → enclosure → inline-img
/// precedence. Returns `None` when the feed carried no usable reference;
/// resolution against the linked page happens later.
fn pick_image(raw: &RawEntry) -> Option<String> {
    if let Some(media) = raw
        .media
        .iter()
        .map(|f| f.as_str().trim())
        .find(|s| !s.is_empty())
    {
        return Some(media.to_string());
    }
    if let Some(enclosure) = field_text(raw.enclosure.as_ref()) {
        return Some(enclosure);
    }
    raw.content_html.as_deref().and_then(first_inline_image)
}

/// What: Find the first inline image of an embedded HTML body.
///
/// Inputs:
/// - `html`: entry body markup
///
/// Output: `src` of the first `<img>` carrying one; `None` otherwise.
#[must_use]
pub fn first_inline_image(html: &str) -> Option<String> {
    let fragment = Html::parse_fragment(html);
    let img = Selector::parse("img").ok()?;
    fragment
        .select(&img)
        .find_map(|el| el.value().attr("src"))
        .filter(|src| !src.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: Option<&str>, link: Option<&str>) -> RawEntry {
        RawEntry {
            title: title.map(|t| FieldValue::PlainText(t.into())),
            link: link.map(|l| FieldValue::PlainText(l.into())),
            ..RawEntry::default()
        }
    }

    #[test]
    fn entries_without_title_or_link_are_dropped() {
        assert!(normalize_entry(&raw(None, Some("https://x"))).is_none());
        assert!(normalize_entry(&raw(Some("T"), None)).is_none());
        assert!(normalize_entry(&raw(Some("  "), Some("https://x"))).is_none());
        assert!(normalize_entry(&raw(Some("T"), Some("https://x"))).is_some());
    }

    #[test]
    fn guid_stands_in_for_a_missing_link() {
        let mut entry = raw(Some("T"), None);
        entry.guid = Some(FieldValue::PlainText("https://example.com/via-guid".into()));
        let normalized = normalize_entry(&entry).expect("guid fallback");
        assert_eq!(normalized.link, "https://example.com/via-guid");
    }

    #[test]
    fn link_attribute_encoding_is_accepted() {
        let mut entry = raw(Some("T"), None);
        entry.link = Some(FieldValue::NestedAttribute("https://example.com/a".into()));
        let normalized = normalize_entry(&entry).expect("href link");
        assert_eq!(normalized.link, "https://example.com/a");
    }

    #[test]
    fn media_wins_over_enclosure_and_body() {
        let mut entry = raw(Some("T"), Some("https://x"));
        entry.media = vec![FieldValue::NestedAttribute("https://img/media.png".into())];
        entry.enclosure = Some(FieldValue::NestedAttribute("https://img/enc.jpg".into()));
        entry.content_html = Some(r#"<img src="https://img/body.gif">"#.into());
        let normalized = normalize_entry(&entry).expect("entry");
        assert_eq!(normalized.image.as_deref(), Some("https://img/media.png"));
    }

    #[test]
    fn empty_media_values_fall_through_to_enclosure() {
        let mut entry = raw(Some("T"), Some("https://x"));
        entry.media = vec![FieldValue::PlainText("   ".into())];
        entry.enclosure = Some(FieldValue::NestedAttribute("https://img/enc.jpg".into()));
        let normalized = normalize_entry(&entry).expect("entry");
        assert_eq!(normalized.image.as_deref(), Some("https://img/enc.jpg"));
    }

    #[test]
    fn inline_body_image_is_the_last_resort() {
        let mut entry = raw(Some("T"), Some("https://x"));
        entry.content_html =
            Some(r#"<p>text</p><img alt="no src"><img src="https://img/body.gif">"#.into());
        let normalized = normalize_entry(&entry).expect("entry");
        assert_eq!(normalized.image.as_deref(), Some("https://img/body.gif"));
    }

    #[test]
    fn image_stays_unset_without_any_reference() {
        let mut entry = raw(Some("T"), Some("https://x"));
        entry.content_html = Some("<p>plain text body</p>".into());
        let normalized = normalize_entry(&entry).expect("entry");
        assert_eq!(normalized.image, None);
    }

    #[test]
    fn first_parseable_date_field_wins() {
        let mut entry = raw(Some("T"), Some("https://x"));
        entry.pub_date = Some("Mon, 01 Jan 2024 00:00:00 +0000".into());
        entry.published = Some("2030-01-01T00:00:00Z".into());
        let normalized = normalize_entry(&entry).expect("entry");
        assert_eq!(
            normalized.published.map(|d| d.to_rfc3339()),
            Some("2024-01-01T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn unparseable_dates_fall_through_to_later_fields() {
        let mut entry = raw(Some("T"), Some("https://x"));
        entry.pub_date = Some("yesterday-ish".into());
        entry.updated = Some("2024-03-01T00:00:00Z".into());
        let normalized = normalize_entry(&entry).expect("entry");
        assert_eq!(
            normalized.published.map(|d| d.to_rfc3339()),
            Some("2024-03-01T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn all_dates_missing_leaves_publish_time_unset() {
        let normalized = normalize_entry(&raw(Some("T"), Some("https://x"))).expect("entry");
        assert_eq!(normalized.published, None);
    }
}
