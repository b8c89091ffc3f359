//! Aggregated feed assembly.
//!
//! Merges every cached feed's items into one RSS 2.0 document. The
//! item link is the uniqueness key at this boundary: when two feeds
//! carry the same link the first occurrence wins. Items are ordered
//! newest first and capped at the configured size.

use std::collections::HashSet;

use chrono::Utc;
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder, SourceBuilder};
use tracing::warn;

use crate::cache::CacheStore;
use crate::config::AggregateConfig;
use crate::feed::types::{FeedItem, FeedMetadata};

/// Merge cached items across feeds: dedup by link, sort newest
/// first, cap at `max_items`.
pub async fn aggregate_items(
    store: &CacheStore,
    feeds: &[FeedMetadata],
    max_items: usize,
) -> Vec<FeedItem> {
    let mut merged: Vec<FeedItem> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for feed in feeds {
        let items = match store.cached_items(&feed.url).await {
            Ok(Some(items)) => items,
            Ok(None) => continue,
            Err(e) => {
                warn!(feed = %feed.url, error = %e, "skipping unreadable feed cache");
                continue;
            }
        };
        for item in items {
            if seen.insert(item.link.clone()) {
                merged.push(item);
            }
        }
    }

    merged.sort_by(|a, b| b.published_at().cmp(&a.published_at()));
    merged.truncate(max_items);
    merged
}

/// Render items as an RSS 2.0 document with the configured channel
/// identity.
pub fn render_rss(items: &[FeedItem], config: &AggregateConfig) -> String {
    let rss_items: Vec<rss::Item> = items
        .iter()
        .map(|item| {
            let mut builder = ItemBuilder::default();
            builder
                .title(item.title.clone())
                .link(item.link.clone())
                .description(item.description.clone())
                .pub_date(item.pub_date.clone())
                .guid(
                    GuidBuilder::default()
                        .value(item.link.clone())
                        .permalink(true)
                        .build(),
                )
                .source(
                    SourceBuilder::default()
                        .url(item.source_link.clone())
                        .title(item.source.clone())
                        .build(),
                );
            builder.build()
        })
        .collect();

    ChannelBuilder::default()
        .title(config.title.clone())
        .link(config.link.clone())
        .description(config.description.clone())
        .generator("Feedscout".to_string())
        .last_build_date(Utc::now().to_rfc2822())
        .items(rss_items)
        .build()
        .to_string()
}

/// Aggregate the cache and render the combined feed.
pub async fn build_feed(
    store: &CacheStore,
    feeds: &[FeedMetadata],
    config: &AggregateConfig,
) -> String {
    let items = aggregate_items(store, feeds, config.max_items).await;
    render_rss(&items, config)
}
