//! File-backed feed cache for feedscout.
//!
//! Persists raw fetched documents, per-feed derived item lists, and a
//! global metadata index. Search and aggregation read from here; only
//! the updater writes.

pub mod store;

pub use store::{CacheStore, CachedFeedDoc, FeedCacheInfo};
