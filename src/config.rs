//! Configuration loading: category/source lists, tunables, and data paths.
//!
//! Configuration lives in `~/.config/feedhub/feedhub.conf` as `key = value`
//! lines. When the file is missing the built-in source catalog is used, so
//! the binary is useful with zero setup.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::sources::placeholder_for;

/// Maximum number of entries kept per category snapshot.
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 70;
/// Minutes between scheduled full refreshes.
pub const DEFAULT_REFRESH_MINUTES: u64 = 30;
/// Items per category enriched during the startup warm-up pass.
pub const STARTUP_ENRICH_COUNT: usize = 20;
/// Items enriched per read-path snapshot request.
pub const READ_ENRICH_COUNT: usize = 60;
/// Concurrent thumbnail resolutions during an enrichment pass.
pub const ENRICH_FANOUT: usize = 8;

/// One configured category: a name, its ordered feed sources, and an
/// optional placeholder-image override.
#[derive(Debug, Clone)]
pub struct CategoryConfig {
    /// Category identifier used by snapshot reads.
    pub name: String,
    /// Ordered feed URLs; order decides dedup-survivor selection.
    pub sources: Vec<String>,
    /// Placeholder image path override for this category.
    pub placeholder: Option<String>,
}

/// Full runtime configuration, fixed at startup.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Configured categories in declaration order.
    pub categories: Vec<CategoryConfig>,
    /// Minutes between scheduled full refreshes.
    pub refresh_minutes: u64,
    /// Maximum entries per category snapshot.
    pub snapshot_limit: usize,
}

impl FeedConfig {
    /// Look up a category by name.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Category → placeholder-image path mapping for the thumbnail resolver.
    #[must_use]
    pub fn placeholder_map(&self) -> HashMap<String, String> {
        self.categories
            .iter()
            .map(|c| {
                let path = c
                    .placeholder
                    .clone()
                    .unwrap_or_else(|| placeholder_for(&c.name));
                (c.name.clone(), path)
            })
            .collect()
    }
}

/// What: Load configuration from `path` or the default location.
///
/// Inputs:
/// - `path`: explicit config file path, or `None` for the default
///
/// Output: parsed configuration; built-in defaults when the file is missing
/// or defines no categories.
#[must_use]
pub fn load(path: Option<&Path>) -> FeedConfig {
    let path = path.map_or_else(default_config_path, Path::to_path_buf);
    match fs::read_to_string(&path) {
        Ok(content) => {
            info!(path = %path.display(), "configuration loaded");
            parse_config(&content)
        }
        Err(_) => {
            info!(path = %path.display(), "no configuration file; using built-in sources");
            default_config()
        }
    }
}

/// Parse `key = value` configuration lines.
///
/// Recognized keys: `category.<name>` (comma-separated feed URLs, repeatable
/// to append), `placeholder.<name>`, `refresh_minutes`, `snapshot_limit`.
/// Unknown keys are logged and skipped.
#[must_use]
pub fn parse_config(content: &str) -> FeedConfig {
    let mut config = FeedConfig {
        categories: Vec::new(),
        refresh_minutes: DEFAULT_REFRESH_MINUTES,
        snapshot_limit: DEFAULT_SNAPSHOT_LIMIT,
    };
    for line in content.lines() {
        if skip_comment_or_empty(line) {
            continue;
        }
        let Some((key, value)) = parse_key_value(line) else {
            continue;
        };
        if let Some(name) = key.strip_prefix("category.") {
            let sources: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if sources.is_empty() {
                continue;
            }
            if let Some(existing) = config.categories.iter_mut().find(|c| c.name == name) {
                existing.sources.extend(sources);
            } else {
                config.categories.push(CategoryConfig {
                    name: name.to_string(),
                    sources,
                    placeholder: None,
                });
            }
        } else if let Some(name) = key.strip_prefix("placeholder.") {
            if let Some(existing) = config.categories.iter_mut().find(|c| c.name == name) {
                existing.placeholder = Some(value);
            } else {
                config.categories.push(CategoryConfig {
                    name: name.to_string(),
                    sources: Vec::new(),
                    placeholder: Some(value),
                });
            }
        } else {
            match key.as_str() {
                "refresh_minutes" => {
                    if let Ok(v) = value.parse::<u64>()
                        && v > 0
                    {
                        config.refresh_minutes = v;
                    }
                }
                "snapshot_limit" => {
                    if let Ok(v) = value.parse::<usize>()
                        && v > 0
                    {
                        config.snapshot_limit = v;
                    }
                }
                _ => warn!(key, "unknown configuration key"),
            }
        }
    }
    if config.categories.is_empty() {
        config.categories = default_categories();
    }
    config
}

/// Built-in configuration used when no config file exists.
#[must_use]
pub fn default_config() -> FeedConfig {
    FeedConfig {
        categories: default_categories(),
        refresh_minutes: DEFAULT_REFRESH_MINUTES,
        snapshot_limit: DEFAULT_SNAPSHOT_LIMIT,
    }
}

/// The built-in category catalog.
fn default_categories() -> Vec<CategoryConfig> {
    let catalog: [(&str, &[&str]); 3] = [
        (
            "tech",
            &[
                "https://www.theverge.com/rss/index.xml",
                "https://feeds.arstechnica.com/arstechnica/index",
                "https://techcrunch.com/feed/",
                "https://www.engadget.com/rss.xml",
                "https://www.wired.com/feed/rss",
                "https://www.tomshardware.com/feeds/all",
                "https://www.theregister.com/headlines.atom",
                "https://hnrss.org/frontpage",
                "https://www.xda-developers.com/feed/",
                "https://feeds.feedburner.com/ign/tech-articles",
            ],
        ),
        (
            "anime",
            &[
                "https://www.animenewsnetwork.com/all/rss.xml",
                "https://myanimelist.net/rss/news.xml",
                "https://animeuknews.net/feed/",
                "https://otakuusamagazine.com/feed/",
            ],
        ),
        (
            "movies",
            &[
                "https://variety.com/feed/",
                "https://www.hollywoodreporter.com/movies/movie-news/feed/",
                "https://collider.com/feed/",
                "https://www.bollywoodhungama.com/rss/news.xml",
            ],
        ),
    ];
    catalog
        .into_iter()
        .map(|(name, sources)| CategoryConfig {
            name: name.to_string(),
            sources: sources.iter().map(ToString::to_string).collect(),
            placeholder: None,
        })
        .collect()
}

/// Check if a line should be skipped (empty or comment).
fn skip_comment_or_empty(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("//")
        || trimmed.starts_with(';')
}

/// Parse a `key = value` pair from a line, trimming both sides.
fn parse_key_value(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if !trimmed.contains('=') {
        return None;
    }
    let mut parts = trimmed.splitn(2, '=');
    let key = parts.next()?.trim().to_string();
    let value = parts.next()?.trim().to_string();
    Some((key, value))
}

/// User config directory: `$HOME/.config/feedhub`, ensured to exist.
fn home_config_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        let dir = Path::new(&home).join(".config").join("feedhub");
        if fs::create_dir_all(&dir).is_ok() {
            return Some(dir);
        }
    }
    None
}

/// Config directory for feedhub (ensured to exist).
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(dir) = home_config_dir() {
        return dir;
    }
    let base = env::var("XDG_CONFIG_HOME")
        .map_or_else(|_| PathBuf::from(".config"), PathBuf::from);
    let dir = base.join("feedhub");
    let _ = fs::create_dir_all(&dir);
    dir
}

/// Logs directory under config (ensured to exist).
#[must_use]
pub fn logs_dir() -> PathBuf {
    let dir = config_dir().join("logs");
    let _ = fs::create_dir_all(&dir);
    dir
}

/// Cache directory under config (ensured to exist).
#[must_use]
pub fn cache_dir() -> PathBuf {
    let dir = config_dir().join("cache");
    let _ = fs::create_dir_all(&dir);
    dir
}

/// Path of the persistent thumbnail cache document.
#[must_use]
pub fn thumbs_path() -> PathBuf {
    cache_dir().join("thumbs.json")
}

/// Default config file path.
fn default_config_path() -> PathBuf {
    config_dir().join("feedhub.conf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config_reads_categories_in_declaration_order() {
        let conf = "\
# comment
category.tech = https://a/feed, https://b/feed
category.games = https://c/feed
refresh_minutes = 15
snapshot_limit = 40
";
        let config = parse_config(conf);
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.categories[0].name, "tech");
        assert_eq!(
            config.categories[0].sources,
            vec!["https://a/feed".to_string(), "https://b/feed".to_string()]
        );
        assert_eq!(config.categories[1].name, "games");
        assert_eq!(config.refresh_minutes, 15);
        assert_eq!(config.snapshot_limit, 40);
    }

    #[test]
    fn repeated_category_keys_append_sources() {
        let conf = "\
category.tech = https://a/feed
category.tech = https://b/feed
";
        let config = parse_config(conf);
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.categories[0].sources.len(), 2);
    }

    #[test]
    fn placeholder_override_is_applied() {
        let conf = "\
category.tech = https://a/feed
placeholder.tech = /assets/tech-fallback.png
";
        let config = parse_config(conf);
        let map = config.placeholder_map();
        assert_eq!(
            map.get("tech").map(String::as_str),
            Some("/assets/tech-fallback.png")
        );
    }

    #[test]
    fn placeholder_defaults_to_category_path() {
        let config = parse_config("category.anime = https://a/feed\n");
        let map = config.placeholder_map();
        assert_eq!(
            map.get("anime").map(String::as_str),
            Some("/placeholders/anime.svg")
        );
    }

    #[test]
    fn empty_input_falls_back_to_builtin_catalog() {
        let config = parse_config("");
        assert_eq!(config.categories.len(), 3);
        assert_eq!(config.categories[0].name, "tech");
        assert_eq!(config.snapshot_limit, DEFAULT_SNAPSHOT_LIMIT);
        assert_eq!(config.refresh_minutes, DEFAULT_REFRESH_MINUTES);
    }

    #[test]
    fn zero_tunables_are_ignored() {
        let config = parse_config("refresh_minutes = 0\nsnapshot_limit = 0\n");
        assert_eq!(config.refresh_minutes, DEFAULT_REFRESH_MINUTES);
        assert_eq!(config.snapshot_limit, DEFAULT_SNAPSHOT_LIMIT);
    }

    #[test]
    fn category_lookup_distinguishes_configured_names() {
        let config = parse_config("category.tech = https://a/feed\n");
        assert!(config.category("tech").is_some());
        assert!(config.category("sports").is_none());
    }
}
