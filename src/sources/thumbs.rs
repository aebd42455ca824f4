//! Best-effort thumbnail resolution by scanning linked pages for meta images.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use scraper::{Html, Selector};
use tracing::debug;

use super::{HTTP_CLIENT, PAGE_TIMEOUT, Result};
use crate::cache::ThumbStore;
use crate::state::Entry;

/// Resolves entry thumbnails, backed by the persistent link → image store.
///
/// Resolution never fails outward: the result is always a usable image
/// path, either a real URL or the category placeholder.
pub struct ThumbnailResolver {
    /// Persistent first-resolution-wins store.
    store: ThumbStore,
    /// Category → placeholder path, fixed at startup.
    placeholders: HashMap<String, String>,
}

impl ThumbnailResolver {
    /// Build a resolver over `store` with the configured placeholder map.
    #[must_use]
    pub fn new(store: ThumbStore, placeholders: HashMap<String, String>) -> Self {
        Self {
            store,
            placeholders,
        }
    }

    /// What: Resolve the best available image for an entry.
    ///
    /// Inputs:
    /// - `entry`: the entry to resolve
    /// - `category`: its category, for the placeholder fallback
    ///
    /// Output: an image URL, never empty.
    ///
    /// Details:
    /// - An image carried by the feed is returned unchanged, no I/O.
    /// - A store hit is returned without a network fetch.
    /// - Otherwise the linked page is fetched and scanned; a discovery is
    ///   persisted before being returned.
    /// - Failures fall back to the category placeholder, which is never
    ///   persisted, so later calls retry against the network.
    pub async fn resolve(&self, entry: &Entry, category: &str) -> String {
        if let Some(image) = &entry.image
            && !image.is_empty()
        {
            return image.clone();
        }
        if let Some(cached) = self.store.get(&entry.link).await {
            return cached;
        }
        match fetch_page_image(&entry.link).await {
            Ok(Some(found)) => {
                self.store.insert(&entry.link, &found).await;
                found
            }
            Ok(None) => {
                debug!(link = %entry.link, "no meta image on page; using placeholder");
                self.placeholder(category)
            }
            Err(e) => {
                debug!(link = %entry.link, error = %e, "page fetch failed; using placeholder");
                self.placeholder(category)
            }
        }
    }

    /// Placeholder path for a category, derived when not configured.
    fn placeholder(&self, category: &str) -> String {
        self.placeholders
            .get(category)
            .cloned()
            .unwrap_or_else(|| placeholder_for(category))
    }
}

/// Default placeholder image path for a category.
#[must_use]
pub fn placeholder_for(category: &str) -> String {
    format!("/placeholders/{category}.svg")
}

/// Fetch a page body and scan it for a meta image.
async fn fetch_page_image(url: &str) -> Result<Option<String>> {
    let response = HTTP_CLIENT.get(url).timeout(PAGE_TIMEOUT).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP error: {status}").into());
    }
    let body = response.text().await?;
    Ok(scan_page_image(&body))
}

/// What: Scan page markup for the best meta-image reference.
///
/// Inputs:
/// - `html`: page markup
///
/// Output: the first match of, in precedence order, the Open Graph image
/// meta tag, the Twitter image meta tag, the `image_src` link tag; `None`
/// when none is present.
#[must_use]
pub fn scan_page_image(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let probes = [
        (r#"meta[property="og:image"]"#, "content"),
        (r#"meta[name="twitter:image"]"#, "content"),
        (r#"link[rel="image_src"]"#, "href"),
    ];
    for (selector, attr) in probes {
        if let Ok(parsed) = Selector::parse(selector)
            && let Some(found) = document
                .select(&parsed)
                .find_map(|el| el.value().attr(attr))
            && !found.is_empty()
        {
            return Some(found.to_string());
        }
    }
    None
}

/// What: Resolve thumbnails for a batch of entries with bounded fan-out.
///
/// Inputs:
/// - `resolver`: the resolver to run against
/// - `category`: category of the entries
/// - `entries`: entries to enrich, order preserved
/// - `fanout`: maximum concurrent resolutions
///
/// Output: the same entries with `image` set on every one.
pub async fn enrich_entries(
    resolver: &ThumbnailResolver,
    category: &str,
    entries: Vec<Entry>,
    fanout: usize,
) -> Vec<Entry> {
    stream::iter(entries.into_iter().map(|mut entry| async move {
        let image = resolver.resolve(&entry, category).await;
        entry.image = Some(image);
        entry
    }))
    .buffered(fanout.max(1))
    .collect()
    .await
}
