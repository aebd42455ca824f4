//! Runtime wiring: startup aggregation, supervised thumbnail warm-up, and
//! the scheduled refresh loop.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::cache::{FeedCache, ThumbStore};
use crate::config::{self, FeedConfig, ENRICH_FANOUT, STARTUP_ENRICH_COUNT};
use crate::sources::{ThumbnailResolver, enrich_entries};
use crate::state::Entry;

/// Result type alias for runtime operations.
type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// What: Run the aggregation engine.
///
/// Inputs:
/// - `config`: full runtime configuration
/// - `once`: when `true`, perform one aggregation plus the warm-up pass and
///   exit instead of entering the refresh loop
///
/// Output: `Ok(())` on clean shutdown (`once` mode only; the scheduler loop
/// runs for the process lifetime).
pub async fn run(config: FeedConfig, once: bool) -> Result<()> {
    let refresh_minutes = config.refresh_minutes;
    let cache = Arc::new(FeedCache::new(&config));
    let store = ThumbStore::load(config::thumbs_path());
    let resolver = Arc::new(ThumbnailResolver::new(store, config.placeholder_map()));

    let fetched_at = cache.refresh_all().await;
    info!(fetched_at = %fetched_at, "initial aggregation complete");

    let (_supervisor, mut ready) =
        spawn_startup_enrichment(Arc::clone(&cache), Arc::clone(&resolver));

    if once {
        let _ = ready.changed().await;
        return Ok(());
    }

    run_scheduler(&cache, Duration::from_secs(refresh_minutes * 60)).await;
    Ok(())
}

/// What: Spawn the supervised startup thumbnail warm-up.
///
/// Inputs:
/// - `cache`: snapshot cache to read the fresh snapshots from
/// - `resolver`: thumbnail resolver whose store gets warmed
///
/// Output: the supervisor task handle and a readiness flag that flips to
/// `true` once the pass has completed (or failed).
///
/// Details: the warm-up resolves the leading items of every category so
/// the first read-path requests hit the persistent store instead of the
/// network. The worker runs detached but supervised: its outcome is always
/// reported, and readiness is observable instead of implicit.
pub fn spawn_startup_enrichment(
    cache: Arc<FeedCache>,
    resolver: Arc<ThumbnailResolver>,
) -> (tokio::task::JoinHandle<()>, watch::Receiver<bool>) {
    let (ready_tx, ready_rx) = watch::channel(false);
    let worker = tokio::spawn(async move {
        let mut resolved = 0usize;
        for name in cache.category_names() {
            let Ok((entries, _)) = cache.snapshot(&name).await else {
                continue;
            };
            let head: Vec<Entry> = entries.into_iter().take(STARTUP_ENRICH_COUNT).collect();
            resolved += enrich_entries(&resolver, &name, head, ENRICH_FANOUT)
                .await
                .len();
        }
        resolved
    });
    let supervisor = tokio::spawn(async move {
        match worker.await {
            Ok(resolved) => info!(resolved, "startup thumbnail warm-up complete"),
            Err(e) => warn!(error = %e, "startup thumbnail warm-up task failed"),
        }
        let _ = ready_tx.send(true);
    });
    (supervisor, ready_rx)
}

/// What: Run the periodic full-refresh loop, forever.
///
/// Inputs:
/// - `cache`: snapshot cache to refresh
/// - `every`: interval between refreshes
///
/// Details: the first interval tick fires immediately and is consumed
/// before the loop, since the caller has already aggregated at startup.
/// On-demand refreshes through [`FeedCache::refresh_all`] do not change
/// this cadence; overlapping runs serialize on the per-category locks.
pub async fn run_scheduler(cache: &FeedCache, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await;
    loop {
        interval.tick().await;
        info!("scheduled refresh starting");
        let fetched_at = cache.refresh_all().await;
        info!(fetched_at = %fetched_at, "scheduled refresh complete");
    }
}
