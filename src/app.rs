//! Shared application state.
//!
//! One [`AppState`] is built from the configuration at startup and
//! handed to every surface (HTTP handlers, MCP tools, the background
//! updater). The search entry point here applies the configured
//! timeout; both surfaces go through it so a slow search fails the
//! same way everywhere.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheStore, FeedCacheInfo};
use crate::config::Config;
use crate::error::{FeedscoutError, Result};
use crate::feed::{FeedFetcher, FeedItem, FeedRegistry, FeedUpdater};
use crate::search::{SearchEngine, SearchOptions, SearchResult};

/// Application state shared across surfaces.
pub struct AppState {
    pub config: Config,
    pub store: Arc<CacheStore>,
    pub registry: Arc<FeedRegistry>,
    pub engine: SearchEngine,
    pub updater: Arc<FeedUpdater>,
}

impl AppState {
    /// Wire up the cache store, registry, search engine and updater
    /// from one configuration.
    pub fn from_config(config: Config) -> Result<Self> {
        let store = Arc::new(CacheStore::open(&config.cache.dir)?);
        let registry = Arc::new(FeedRegistry::new(&config.feeds.opml_path));
        let engine = SearchEngine::new(store.clone(), config.search.batch_size);
        let fetcher = FeedFetcher::new(&config.feeds)?;
        let updater = Arc::new(FeedUpdater::new(
            registry.clone(),
            store.clone(),
            fetcher,
            config.feeds.clone(),
            config.search.batch_size,
        ));

        Ok(Self {
            config,
            store,
            registry,
            engine,
            updater,
        })
    }

    /// Search options seeded with the configured defaults.
    pub fn default_search_options(&self) -> SearchOptions {
        SearchOptions::new()
            .with_limit(self.config.search.default_limit)
            .with_word_boundary(self.config.search.word_boundary)
            .with_fuzzy_tolerance(self.config.search.fuzzy_tolerance)
            .with_per_feed_limit(self.config.search.per_feed_limit)
    }

    /// Run a search over the registered feeds, bounded by the
    /// configured timeout.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResult> {
        let feeds = self.registry.feeds().await?;
        let timeout = Duration::from_millis(self.config.search.timeout_ms);
        match tokio::time::timeout(timeout, self.engine.search(&feeds, query, options)).await {
            Ok(result) => result,
            Err(_) => Err(FeedscoutError::SearchTimeout(self.config.search.timeout_ms)),
        }
    }

    /// Registered feeds with their cache bookkeeping.
    pub async fn feed_infos(&self) -> Result<Vec<FeedCacheInfo>> {
        let feeds = self.registry.feeds().await?;
        self.store.sync_metadata(&feeds).await?;
        self.store.feed_info().await
    }

    /// Cached items for one registered feed, newest first.
    ///
    /// A feed that is registered but not yet fetched yields an empty
    /// list; an unregistered URL is not found.
    pub async fn feed_items(&self, feed_url: &str, limit: usize) -> Result<Vec<FeedItem>> {
        let feeds = self.registry.feeds().await?;
        if !feeds.iter().any(|feed| feed.url == feed_url) {
            return Err(FeedscoutError::NotFound(format!("feed {}", feed_url)));
        }
        let mut items = self.store.cached_items(feed_url).await?.unwrap_or_default();
        items.truncate(limit);
        Ok(items)
    }
}
