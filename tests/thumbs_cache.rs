//! Thumbnail resolution and persistence tests.
//!
//! Links use invalid URLs on purpose: the client rejects them before any
//! network I/O, so failure paths are exercised deterministically.

use std::collections::HashMap;

use feedhub::cache::ThumbStore;
use feedhub::sources::{ThumbnailResolver, placeholder_for};
use feedhub::state::Entry;

fn entry(link: &str) -> Entry {
    Entry {
        title: "T".to_string(),
        link: link.to_string(),
        published: None,
        image: None,
    }
}

#[tokio::test]
async fn feed_supplied_images_short_circuit_resolution() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ThumbStore::load(dir.path().join("thumbs.json"));
    let resolver = ThumbnailResolver::new(store, HashMap::new());

    let mut item = entry("not-a-url");
    item.image = Some("http://img/from-feed.png".to_string());

    let resolved = resolver.resolve(&item, "tech").await;
    assert_eq!(resolved, "http://img/from-feed.png");
}

#[tokio::test]
async fn cached_resolutions_are_served_without_a_fetch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("thumbs.json");

    let store = ThumbStore::load(path.clone());
    store.insert("not-a-url", "http://img/a.png").await;
    let resolver = ThumbnailResolver::new(store, HashMap::new());

    // The link is not fetchable, so only a cache hit can produce this value.
    let resolved = resolver.resolve(&entry("not-a-url"), "tech").await;
    assert_eq!(resolved, "http://img/a.png");
}

#[tokio::test]
async fn resolutions_survive_a_store_reload() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("thumbs.json");

    let store = ThumbStore::load(path.clone());
    store.insert("not-a-url", "http://img/a.png").await;
    drop(store);

    let resolver = ThumbnailResolver::new(ThumbStore::load(path), HashMap::new());
    let resolved = resolver.resolve(&entry("not-a-url"), "tech").await;
    assert_eq!(resolved, "http://img/a.png");
}

#[tokio::test]
async fn failed_resolution_falls_back_to_the_category_placeholder() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ThumbStore::load(dir.path().join("thumbs.json"));
    let resolver = ThumbnailResolver::new(store, HashMap::new());

    let resolved = resolver.resolve(&entry("not-a-url"), "movies").await;
    assert_eq!(resolved, placeholder_for("movies"));
    assert_eq!(resolved, "/placeholders/movies.svg");
}

#[tokio::test]
async fn configured_placeholders_override_the_derived_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ThumbStore::load(dir.path().join("thumbs.json"));
    let mut placeholders = HashMap::new();
    placeholders.insert("tech".to_string(), "/assets/tech.png".to_string());
    let resolver = ThumbnailResolver::new(store, placeholders);

    let resolved = resolver.resolve(&entry("not-a-url"), "tech").await;
    assert_eq!(resolved, "/assets/tech.png");
}

#[tokio::test]
async fn failures_are_never_cached_so_resolution_can_retry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("thumbs.json");

    let resolver = ThumbnailResolver::new(ThumbStore::load(path.clone()), HashMap::new());
    let resolved = resolver.resolve(&entry("not-a-url"), "tech").await;
    assert_eq!(resolved, placeholder_for("tech"));
    drop(resolver);

    // Nothing was persisted for the failed link.
    let reloaded = ThumbStore::load(path.clone());
    assert_eq!(reloaded.get("not-a-url").await, None);
    assert!(reloaded.is_empty().await);

    // Once the mapping exists (as if the host recovered), the same link
    // resolves from the store instead of the placeholder.
    reloaded.insert("not-a-url", "http://img/late.png").await;
    let resolver = ThumbnailResolver::new(reloaded, HashMap::new());
    let resolved = resolver.resolve(&entry("not-a-url"), "tech").await;
    assert_eq!(resolved, "http://img/late.png");
}
