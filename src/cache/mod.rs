//! In-memory snapshot cache and category aggregation.
//!
//! [`FeedCache`] owns all snapshot state behind its own locks and is the
//! only writer; callers interact exclusively through the read and refresh
//! operations below.

mod thumbs;

pub use thumbs::ThumbStore;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::{CategoryConfig, ENRICH_FANOUT, FeedConfig, READ_ENRICH_COUNT};
use crate::sources::{ThumbnailResolver, enrich_entries, fetch_entries};
use crate::state::{Entry, SnapshotError};

/// Snapshot cache for all configured categories plus the single global
/// refresh timestamp.
///
/// Readers always get a consistent, possibly stale view; refresh runs
/// replace whole snapshots under a short write lock and never expose
/// partial state. Refreshes of the same category serialize on a
/// per-category lock so an older run cannot overwrite a newer one.
pub struct FeedCache {
    /// Configured categories in declaration order.
    categories: Vec<CategoryConfig>,
    /// Maximum entries kept per snapshot.
    limit: usize,
    /// Current snapshot per category.
    snapshots: RwLock<HashMap<String, Vec<Entry>>>,
    /// Time of the last successful refresh, shared across categories.
    fetched_at: RwLock<Option<DateTime<Utc>>>,
    /// Per-category refresh serialization.
    refresh_locks: HashMap<String, Mutex<()>>,
}

impl FeedCache {
    /// Build an empty cache for the configured categories.
    #[must_use]
    pub fn new(config: &FeedConfig) -> Self {
        let refresh_locks = config
            .categories
            .iter()
            .map(|c| (c.name.clone(), Mutex::new(())))
            .collect();
        Self {
            categories: config.categories.clone(),
            limit: config.snapshot_limit,
            snapshots: RwLock::new(HashMap::new()),
            fetched_at: RwLock::new(None),
            refresh_locks,
        }
    }

    /// Configured category names in declaration order.
    #[must_use]
    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }

    /// What: Re-aggregate one category and swap its snapshot.
    ///
    /// Inputs:
    /// - `name`: category to refresh
    ///
    /// Output: `Ok(count)` with the new snapshot size, or
    /// [`SnapshotError::UnknownCategory`].
    ///
    /// Details:
    /// - All sources fetch concurrently; the merge re-imposes configured
    ///   source order before dedup, so survivor selection is deterministic.
    /// - A failing source contributes zero entries.
    /// - The snapshot replacement is a single map insert under the write
    ///   lock; readers never observe a partial snapshot.
    pub async fn refresh_category(&self, name: &str) -> Result<usize, SnapshotError> {
        let category = self
            .categories
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SnapshotError::UnknownCategory(name.to_string()))?;
        let Some(lock) = self.refresh_locks.get(name) else {
            return Err(SnapshotError::UnknownCategory(name.to_string()));
        };
        let _guard = lock.lock().await;

        let per_source = join_all(category.sources.iter().map(|url| fetch_entries(url))).await;
        let merged = merge_entries(per_source, self.limit);
        let count = merged.len();
        self.snapshots
            .write()
            .await
            .insert(name.to_string(), merged);
        *self.fetched_at.write().await = Some(Utc::now());
        info!(category = name, items = count, "category snapshot replaced");
        Ok(count)
    }

    /// What: Re-aggregate every configured category.
    ///
    /// Output: the new global refresh timestamp.
    ///
    /// Details: categories refresh one after another (each still fanning
    /// out its own sources concurrently), matching the scheduler's cadence
    /// expectations.
    pub async fn refresh_all(&self) -> DateTime<Utc> {
        info!(categories = self.categories.len(), "full refresh starting");
        for category in &self.categories {
            if let Err(e) = self.refresh_category(&category.name).await {
                warn!(category = %category.name, error = %e, "category refresh failed");
            }
        }
        let fetched_at = (*self.fetched_at.read().await).unwrap_or_else(Utc::now);
        info!(fetched_at = %fetched_at, "full refresh complete");
        fetched_at
    }

    /// What: Read a category snapshot.
    ///
    /// Inputs:
    /// - `name`: category to read
    ///
    /// Output: the snapshot entries plus the global refresh timestamp, or
    /// [`SnapshotError::UnknownCategory`]. A configured category that has
    /// not refreshed yet reads as empty, which is a distinct condition from
    /// an unknown one.
    pub async fn snapshot(
        &self,
        name: &str,
    ) -> Result<(Vec<Entry>, Option<DateTime<Utc>>), SnapshotError> {
        if !self.categories.iter().any(|c| c.name == name) {
            return Err(SnapshotError::UnknownCategory(name.to_string()));
        }
        let entries = self
            .snapshots
            .read()
            .await
            .get(name)
            .cloned()
            .unwrap_or_default();
        let fetched_at = *self.fetched_at.read().await;
        Ok((entries, fetched_at))
    }

    /// Read-path snapshot: the first items with thumbnails resolved, the
    /// fan-out capped so one read cannot flood the resolver's outbound
    /// volume. Never triggers a feed fetch.
    pub async fn snapshot_enriched(
        &self,
        name: &str,
        resolver: &ThumbnailResolver,
    ) -> Result<(Vec<Entry>, Option<DateTime<Utc>>), SnapshotError> {
        let (mut entries, fetched_at) = self.snapshot(name).await?;
        entries.truncate(READ_ENRICH_COUNT);
        let enriched = enrich_entries(resolver, name, entries, ENRICH_FANOUT).await;
        Ok((enriched, fetched_at))
    }
}

/// What: Merge per-source entry lists into one bounded, deduplicated
/// snapshot.
///
/// Inputs:
/// - `per_source`: fetch results in configured source order
/// - `limit`: maximum snapshot size
///
/// Output: entries in first-seen order, one per link, at most `limit`.
#[must_use]
pub fn merge_entries(per_source: Vec<Vec<Entry>>, limit: usize) -> Vec<Entry> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged: Vec<Entry> = Vec::new();
    for source_entries in per_source {
        for entry in source_entries {
            if merged.len() == limit {
                return merged;
            }
            if seen.insert(entry.link.clone()) {
                merged.push(entry);
            }
        }
    }
    merged
}
