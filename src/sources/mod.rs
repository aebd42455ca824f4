//! Network retrieval and enrichment: feed fetching, entry scanning,
//! normalization, and thumbnail resolution.

mod fetch;
mod normalize;
mod thumbs;

pub use fetch::{fetch_entries, scan_feed_document};
pub use normalize::{first_inline_image, normalize_entry};
pub use thumbs::{ThumbnailResolver, enrich_entries, placeholder_for, scan_page_image};

use std::sync::LazyLock;
use std::time::Duration;

/// Result type alias for network retrieval operations.
type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Timeout applied to feed document requests.
const FEED_TIMEOUT: Duration = Duration::from_secs(20);
/// Timeout applied to page fetches during thumbnail resolution.
const PAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared HTTP client with connection pooling for all outbound requests.
/// Identifies the process with a fixed User-Agent carrying the crate version.
static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(FEED_TIMEOUT)
        .user_agent(concat!("feedhub/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to create HTTP client")
});
