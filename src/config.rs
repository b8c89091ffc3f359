//! Configuration module for feedscout.

use serde::Deserialize;
use std::path::Path;

use crate::{FeedscoutError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Feed list and fetching configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedsConfig {
    /// Path to the OPML file listing the feeds.
    #[serde(default = "default_opml_path")]
    pub opml_path: String,
    /// Background refresh interval in minutes.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_minutes: u64,
    /// Items older than this many days are dropped at extraction
    /// time. 0 disables the cutoff.
    #[serde(default = "default_max_item_age")]
    pub max_item_age_days: u32,
    /// Maximum byte length of an item description after stripping.
    #[serde(default = "default_description_max_bytes")]
    pub description_max_bytes: usize,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
}

fn default_opml_path() -> String {
    "feeds.opml".to_string()
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_max_item_age() -> u32 {
    90
}

fn default_description_max_bytes() -> usize {
    500
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    20
}

fn default_total_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            opml_path: default_opml_path(),
            refresh_interval_minutes: default_refresh_interval(),
            max_item_age_days: default_max_item_age(),
            description_max_bytes: default_description_max_bytes(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
            max_feed_size_bytes: default_max_feed_size(),
        }
    }
}

/// Cache store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Root directory for cache files.
    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

fn default_cache_dir() -> String {
    "data/cache".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

/// Search engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Default maximum number of results when the caller gives none.
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,
    /// Default per-feed result cap before the global merge.
    #[serde(default = "default_per_feed_limit")]
    pub per_feed_limit: usize,
    /// Default fuzzy edit-distance tolerance (0-2).
    #[serde(default = "default_fuzzy_tolerance")]
    pub fuzzy_tolerance: u8,
    /// Whether word-boundary matching is on by default.
    #[serde(default = "default_word_boundary")]
    pub word_boundary: bool,
    /// Number of feeds read concurrently per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Deadline for one search call in milliseconds, enforced at the
    /// tool-call boundary.
    #[serde(default = "default_search_timeout")]
    pub timeout_ms: u64,
}

fn default_search_limit() -> usize {
    20
}

fn default_per_feed_limit() -> usize {
    10
}

fn default_fuzzy_tolerance() -> u8 {
    1
}

fn default_word_boundary() -> bool {
    true
}

fn default_batch_size() -> usize {
    10
}

fn default_search_timeout() -> u64 {
    10_000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
            per_feed_limit: default_per_feed_limit(),
            fuzzy_tolerance: default_fuzzy_tolerance(),
            word_boundary: default_word_boundary(),
            batch_size: default_batch_size(),
            timeout_ms: default_search_timeout(),
        }
    }
}

/// Aggregated output feed configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateConfig {
    /// Channel title of the aggregated feed.
    #[serde(default = "default_aggregate_title")]
    pub title: String,
    /// Channel description.
    #[serde(default = "default_aggregate_description")]
    pub description: String,
    /// Channel site link.
    #[serde(default = "default_aggregate_link")]
    pub link: String,
    /// Maximum number of items in the aggregated feed.
    #[serde(default = "default_aggregate_max_items")]
    pub max_items: usize,
}

fn default_aggregate_title() -> String {
    "Feedscout".to_string()
}

fn default_aggregate_description() -> String {
    "Aggregated feed".to_string()
}

fn default_aggregate_link() -> String {
    "http://localhost:8080".to_string()
}

fn default_aggregate_max_items() -> usize {
    100
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            title: default_aggregate_title(),
            description: default_aggregate_description(),
            link: default_aggregate_link(),
            max_items: default_aggregate_max_items(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/feedscout.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Feed list and fetching configuration.
    #[serde(default)]
    pub feeds: FeedsConfig,
    /// Cache store configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Search engine configuration.
    #[serde(default)]
    pub search: SearchConfig,
    /// Aggregated output feed configuration.
    #[serde(default)]
    pub aggregate: AggregateConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FeedscoutError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment
    /// variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FeedscoutError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FEEDSCOUT_CACHE_DIR`: Override the cache directory
    /// - `FEEDSCOUT_OPML_PATH`: Override the OPML file path
    /// - `FEEDSCOUT_PORT`: Override the HTTP port
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("FEEDSCOUT_CACHE_DIR") {
            if !dir.is_empty() {
                self.cache.dir = dir;
            }
        }
        if let Ok(path) = std::env::var("FEEDSCOUT_OPML_PATH") {
            if !path.is_empty() {
                self.feeds.opml_path = path;
            }
        }
        if let Ok(port) = std::env::var("FEEDSCOUT_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.feeds.opml_path.is_empty() {
            return Err(FeedscoutError::Config(
                "feeds.opml_path must not be empty".to_string(),
            ));
        }
        if self.cache.dir.is_empty() {
            return Err(FeedscoutError::Config(
                "cache.dir must not be empty".to_string(),
            ));
        }
        if self.search.fuzzy_tolerance > 2 {
            return Err(FeedscoutError::Config(format!(
                "search.fuzzy_tolerance must be 0-2, got {}",
                self.search.fuzzy_tolerance
            )));
        }
        if self.search.batch_size == 0 {
            return Err(FeedscoutError::Config(
                "search.batch_size must be at least 1".to_string(),
            ));
        }
        if self.search.default_limit == 0 || self.search.per_feed_limit == 0 {
            return Err(FeedscoutError::Config(
                "search limits must be at least 1".to_string(),
            ));
        }
        if self.feeds.max_feed_size_bytes == 0 {
            return Err(FeedscoutError::Config(
                "feeds.max_feed_size_bytes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
