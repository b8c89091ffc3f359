//! Feedscout - RSS/Atom feed aggregator with relevance search.
//!
//! Fetches configured feeds into a disk cache, serves them as one
//! aggregated feed over HTTP and exposes relevance-ranked search both
//! as a JSON API and as MCP tools.

pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod mcp;
pub mod search;
pub mod text;
pub mod web;

pub use app::AppState;
pub use cache::{CacheStore, CachedFeedDoc, FeedCacheInfo};
pub use config::Config;
pub use error::{FeedscoutError, Result};
pub use feed::{FeedItem, FeedMetadata, FeedUpdater, RefreshSummary};
pub use search::{ParsedQuery, SearchEngine, SearchOptions, SearchResult};
pub use web::WebServer;
