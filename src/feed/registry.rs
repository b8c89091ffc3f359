//! Configured feed list, backed by the OPML file.
//!
//! The parsed list is cached and only re-read when the file's mtime
//! changes, so a running search always sees one consistent snapshot.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::RwLock;

use crate::error::{FeedscoutError, Result};
use crate::feed::opml::parse_opml;
use crate::feed::types::FeedMetadata;

struct RegistryState {
    modified: SystemTime,
    feeds: Arc<Vec<FeedMetadata>>,
}

/// Feed list registry with mtime-based reload.
pub struct FeedRegistry {
    path: PathBuf,
    state: RwLock<Option<RegistryState>>,
}

impl FeedRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(None),
        }
    }

    /// Current feed list snapshot, reloading the OPML file if it
    /// changed on disk.
    pub async fn feeds(&self) -> Result<Arc<Vec<FeedMetadata>>> {
        let modified = tokio::fs::metadata(&self.path)
            .await
            .and_then(|meta| meta.modified())
            .map_err(|e| {
                FeedscoutError::Config(format!(
                    "cannot read OPML file {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        {
            let state = self.state.read().await;
            if let Some(state) = state.as_ref() {
                if state.modified == modified {
                    return Ok(state.feeds.clone());
                }
            }
        }

        let xml = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            FeedscoutError::Config(format!(
                "cannot read OPML file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let feeds = Arc::new(parse_opml(&xml)?);

        let mut state = self.state.write().await;
        *state = Some(RegistryState {
            modified,
            feeds: feeds.clone(),
        });
        Ok(feeds)
    }
}
