//! Background feed updater.
//!
//! Periodically fetches every registered feed, extracts items and
//! writes them through the cache store. One-shot refreshes are
//! exposed for the CLI and the MCP tools. A feed that fails to fetch
//! or parse is logged and skipped; the rest of the run continues.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::FeedsConfig;
use crate::error::{FeedscoutError, Result};
use crate::feed::extract::extract_feed;
use crate::feed::fetcher::{parse_feed_bytes, FeedFetcher};
use crate::feed::registry::FeedRegistry;
use crate::feed::types::FeedMetadata;

/// Outcome of one refresh run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub feeds_refreshed: usize,
    pub feeds_failed: usize,
    pub items_cached: usize,
}

/// Feed background updater.
pub struct FeedUpdater {
    registry: Arc<FeedRegistry>,
    store: Arc<CacheStore>,
    fetcher: FeedFetcher,
    config: FeedsConfig,
    batch_size: usize,
}

impl FeedUpdater {
    pub fn new(
        registry: Arc<FeedRegistry>,
        store: Arc<CacheStore>,
        fetcher: FeedFetcher,
        config: FeedsConfig,
        batch_size: usize,
    ) -> Self {
        Self {
            registry,
            store,
            fetcher,
            config,
            batch_size: batch_size.max(1),
        }
    }

    /// Run the updater loop.
    ///
    /// The first tick fires immediately, so the cache is populated at
    /// startup; after that the loop runs at the configured interval.
    pub async fn run(&self) {
        info!(
            "feed updater started (interval: {} minutes)",
            self.config.refresh_interval_minutes
        );

        let mut timer = interval(Duration::from_secs(
            self.config.refresh_interval_minutes.max(1) * 60,
        ));

        loop {
            timer.tick().await;
            match self.refresh_all().await {
                Ok(summary) => info!(
                    refreshed = summary.feeds_refreshed,
                    failed = summary.feeds_failed,
                    items = summary.items_cached,
                    "feed refresh complete"
                ),
                Err(e) => warn!(error = %e, "feed refresh failed"),
            }
        }
    }

    /// Refresh every registered feed once, in batches.
    pub async fn refresh_all(&self) -> Result<RefreshSummary> {
        let feeds = self.registry.feeds().await?;
        self.store.sync_metadata(&feeds).await?;

        if feeds.is_empty() {
            debug!("no feeds registered");
            return Ok(RefreshSummary::default());
        }

        info!("refreshing {} feed(s)", feeds.len());

        let mut summary = RefreshSummary::default();
        for batch in feeds.chunks(self.batch_size) {
            let outcomes = join_all(batch.iter().map(|feed| self.refresh_feed(feed))).await;
            for (feed, outcome) in batch.iter().zip(outcomes) {
                match outcome {
                    Ok(count) => {
                        summary.feeds_refreshed += 1;
                        summary.items_cached += count;
                        debug!(feed = %feed.url, items = count, "feed refreshed");
                    }
                    Err(e) => {
                        summary.feeds_failed += 1;
                        warn!(feed = %feed.url, error = %e, "failed to refresh feed");
                    }
                }
            }
        }
        Ok(summary)
    }

    /// Fetch, extract and cache one feed. Returns the number of items
    /// cached.
    pub async fn refresh_feed(&self, metadata: &FeedMetadata) -> Result<usize> {
        let bytes = self.fetcher.fetch(&metadata.url).await?;
        self.store.store_raw(&metadata.url, &bytes).await?;

        let parsed = parse_feed_bytes(&bytes)?;
        let extracted = extract_feed(parsed, metadata, &self.config);
        let count = extracted.items.len();
        let doc = extracted.into_cached_doc(&metadata.url, Utc::now());
        self.store.store_feed(&doc).await?;
        Ok(count)
    }

    /// Refresh a single registered feed by URL.
    pub async fn refresh_one(&self, feed_url: &str) -> Result<usize> {
        let feeds = self.registry.feeds().await?;
        let metadata = feeds
            .iter()
            .find(|feed| feed.url == feed_url)
            .ok_or_else(|| FeedscoutError::NotFound(format!("feed {}", feed_url)))?;
        self.refresh_feed(metadata).await
    }
}

/// Spawn the updater loop as a background task.
pub fn start_updater(updater: Arc<FeedUpdater>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        updater.run().await;
    })
}
