//! File-backed feed cache.
//!
//! Layout under the configured root:
//! - `raw/<key>.xml`: raw fetched feed documents
//! - `feeds/<key>.json`: per-feed derived item lists
//! - `metadata.json`: global index of known feeds
//!
//! `<key>` is a sanitized prefix of the feed URL plus a short SHA-256
//! digest, so distinct URLs never collide and every key is
//! filesystem-safe.
//!
//! Writers (the updater) go through atomic tmp-file + rename. Readers
//! (search, aggregation, the APIs) never write. Parsed documents are
//! held in an in-memory cache keyed by path; an entry is only served
//! after re-statting the file and comparing modification times.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::error::{FeedscoutError, Result};
use crate::feed::types::{FeedItem, FeedMetadata};

/// Maximum number of parsed feed documents held in memory.
const PARSE_CACHE_CAPACITY: u64 = 256;

/// Maximum length of the sanitized URL prefix in a cache key.
const KEY_PREFIX_MAX: usize = 40;

/// Per-feed cache document stored under `feeds/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedFeedDoc {
    /// URL the feed was fetched from.
    pub feed_url: String,
    /// Feed title at fetch time.
    pub title: String,
    /// Feed site link.
    pub site_link: String,
    /// Feed-level image, if the feed declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// When the feed was fetched.
    pub fetched_at: DateTime<Utc>,
    /// Extracted items, newest first.
    pub items: Vec<FeedItem>,
}

/// One entry in the metadata index: configured metadata plus fetch
/// bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedCacheInfo {
    /// Configured feed metadata.
    #[serde(flatten)]
    pub metadata: FeedMetadata,
    /// When the feed was last fetched, if ever.
    pub fetched_at: Option<DateTime<Utc>>,
    /// Number of items in the cached document.
    pub item_count: usize,
}

/// On-disk shape of `metadata.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MetadataIndex {
    feeds: Vec<FeedCacheInfo>,
}

/// A parse-cache entry: the parsed document plus the file mtime it
/// was read at.
#[derive(Clone)]
struct CachedDocEntry {
    modified: SystemTime,
    doc: Arc<CachedFeedDoc>,
}

/// File-backed feed cache store.
pub struct CacheStore {
    root: PathBuf,
    parse_cache: Cache<PathBuf, CachedDocEntry>,
    index_lock: Mutex<()>,
}

impl CacheStore {
    /// Open a cache store rooted at `root`, creating the directory
    /// layout if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join("raw"))?;
        std::fs::create_dir_all(root.join("feeds"))?;
        Ok(Self {
            root,
            parse_cache: Cache::builder().max_capacity(PARSE_CACHE_CAPACITY).build(),
            index_lock: Mutex::new(()),
        })
    }

    /// Path of the per-feed document for a feed URL.
    pub fn feed_doc_path(&self, feed_url: &str) -> PathBuf {
        self.root.join("feeds").join(format!("{}.json", feed_key(feed_url)))
    }

    /// Path of the raw document for a feed URL.
    pub fn raw_path(&self, feed_url: &str) -> PathBuf {
        self.root.join("raw").join(format!("{}.xml", feed_key(feed_url)))
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("metadata.json")
    }

    /// Check whether a per-feed document exists on disk.
    pub async fn has_cached_items(&self, feed_url: &str) -> bool {
        tokio::fs::try_exists(self.feed_doc_path(feed_url))
            .await
            .unwrap_or(false)
    }

    /// Load the cached items for one feed.
    ///
    /// `Ok(None)` means the feed was never cached. A corrupt document
    /// is an error; callers at the per-feed boundary decide whether
    /// to tolerate it.
    pub async fn cached_items(&self, feed_url: &str) -> Result<Option<Vec<FeedItem>>> {
        let doc = match self.cached_doc(feed_url).await? {
            Some(doc) => doc,
            None => return Ok(None),
        };
        let items = doc
            .items
            .iter()
            .cloned()
            .map(|mut item| {
                if item.feed_url.is_empty() {
                    item.feed_url = doc.feed_url.clone();
                }
                item
            })
            .collect();
        Ok(Some(items))
    }

    /// Load the full cached document for one feed, through the parse
    /// cache.
    pub async fn cached_doc(&self, feed_url: &str) -> Result<Option<Arc<CachedFeedDoc>>> {
        let path = self.feed_doc_path(feed_url);

        let modified = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.modified()?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if let Some(entry) = self.parse_cache.get(&path).await {
            if entry.modified == modified {
                return Ok(Some(entry.doc));
            }
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let doc: CachedFeedDoc = serde_json::from_slice(&bytes).map_err(|e| {
            FeedscoutError::Cache(format!("corrupt feed document {}: {}", path.display(), e))
        })?;
        let doc = Arc::new(doc);
        self.parse_cache
            .insert(
                path,
                CachedDocEntry {
                    modified,
                    doc: doc.clone(),
                },
            )
            .await;
        Ok(Some(doc))
    }

    /// List metadata for all feeds known to the index.
    pub async fn feed_metadata(&self) -> Result<Vec<FeedMetadata>> {
        Ok(self
            .read_index()
            .await?
            .feeds
            .into_iter()
            .map(|info| info.metadata)
            .collect())
    }

    /// List all feeds with fetch bookkeeping.
    pub async fn feed_info(&self) -> Result<Vec<FeedCacheInfo>> {
        Ok(self.read_index().await?.feeds)
    }

    /// Store a raw fetched document.
    pub async fn store_raw(&self, feed_url: &str, bytes: &[u8]) -> Result<()> {
        write_atomic(&self.raw_path(feed_url), bytes).await
    }

    /// Store a per-feed document and update the metadata index.
    pub async fn store_feed(&self, doc: &CachedFeedDoc) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        write_atomic(&self.feed_doc_path(&doc.feed_url), &bytes).await?;

        let _guard = self.index_lock.lock().await;
        let mut index = self.read_index().await?;
        let pos = match index.feeds.iter().position(|f| f.metadata.url == doc.feed_url) {
            Some(pos) => pos,
            None => {
                index.feeds.push(FeedCacheInfo {
                    metadata: FeedMetadata::new(doc.feed_url.clone(), doc.title.clone()),
                    fetched_at: None,
                    item_count: 0,
                });
                index.feeds.len() - 1
            }
        };
        let info = &mut index.feeds[pos];
        info.metadata.title = doc.title.clone();
        info.fetched_at = Some(doc.fetched_at);
        info.item_count = doc.items.len();
        self.write_index(&index).await
    }

    /// Merge the configured feed list into the metadata index,
    /// preserving fetch bookkeeping for feeds already known.
    pub async fn sync_metadata(&self, feeds: &[FeedMetadata]) -> Result<()> {
        let _guard = self.index_lock.lock().await;
        let old = self.read_index().await?;
        let mut index = MetadataIndex::default();
        for meta in feeds {
            let existing = old.feeds.iter().find(|f| f.metadata.url == meta.url);
            index.feeds.push(FeedCacheInfo {
                metadata: meta.clone(),
                fetched_at: existing.and_then(|f| f.fetched_at),
                item_count: existing.map(|f| f.item_count).unwrap_or(0),
            });
        }
        self.write_index(&index).await
    }

    async fn read_index(&self) -> Result<MetadataIndex> {
        let bytes = match tokio::fs::read(self.index_path()).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(MetadataIndex::default())
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            FeedscoutError::Cache(format!("corrupt metadata index: {}", e))
        })
    }

    async fn write_index(&self, index: &MetadataIndex) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(index)?;
        write_atomic(&self.index_path(), &bytes).await
    }
}

/// Write a file atomically via a temp file and rename.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Build a filesystem-safe cache key for a feed URL: a sanitized,
/// truncated URL prefix for readability plus a short digest for
/// uniqueness.
fn feed_key(url: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(url.as_bytes()));
    let short = &digest[..12];

    let sanitized: String = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let prefix = sanitized[..sanitized.len().min(KEY_PREFIX_MAX)].trim_matches('-');

    if prefix.is_empty() {
        format!("feed-{}", short)
    } else {
        format!("{}-{}", prefix, short)
    }
}
