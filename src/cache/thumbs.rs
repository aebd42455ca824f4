//! Persistent link → image store backing the thumbnail resolver.
//!
//! The store is one JSON document loaded fully at startup and rewritten
//! fully after each new discovery. The in-memory map is authoritative; both
//! it and the disk rewrite sit behind one async lock, so concurrent
//! discoveries serialize instead of losing each other's updates.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Persistent mapping from entry link to resolved image URL.
pub struct ThumbStore {
    /// Location of the JSON document.
    path: PathBuf,
    /// Authoritative in-memory copy.
    entries: Mutex<HashMap<String, String>>,
}

impl ThumbStore {
    /// What: Load the store from disk.
    ///
    /// Inputs:
    /// - `path`: JSON document location
    ///
    /// Output: a ready store. A missing or unparseable file is treated as
    /// empty and reinitialized on the next write.
    #[must_use]
    pub fn load(path: PathBuf) -> Self {
        let entries: HashMap<String, String> = std::fs::read_to_string(&path).map_or_else(
            |_| HashMap::new(),
            |content| serde_json::from_str(&content).unwrap_or_default(),
        );
        info!(path = %path.display(), entries = entries.len(), "thumbnail cache loaded");
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Cached image URL for a link, if one was ever resolved.
    pub async fn get(&self, link: &str) -> Option<String> {
        self.entries.lock().await.get(link).cloned()
    }

    /// What: Record a resolved image for a link and persist the store.
    ///
    /// Inputs:
    /// - `link`: entry link
    /// - `image`: resolved image URL
    ///
    /// Details:
    /// - The first resolution for a link wins permanently; later inserts
    ///   for the same link are ignored.
    /// - The full document is rewritten under the same lock that guards the
    ///   map, so interleaved discoveries cannot drop entries.
    /// - Write failures are logged, not propagated; the in-memory copy
    ///   still serves readers.
    pub async fn insert(&self, link: &str, image: &str) {
        let mut entries = self.entries.lock().await;
        if entries.contains_key(link) {
            return;
        }
        entries.insert(link.to_string(), image.to_string());
        match serde_json::to_string_pretty(&*entries) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    warn!(error = %e, link, "failed to write thumbnail cache");
                } else {
                    debug!(link, total = entries.len(), "thumbnail cached");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize thumbnail cache"),
        }
    }

    /// Number of cached links.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
