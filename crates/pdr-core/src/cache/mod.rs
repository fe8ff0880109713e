//! Persistent resolution cache: landing URL to its last usable asset list.
//!
//! Every operation takes the lock for its file and re-reads it, so entries
//! written by other resolutions in flight are kept. Handles opened on the
//! same path within one process share that lock. Unreadable state
//! is logged and treated as empty; the next successful `put` replaces it.

mod persist;

pub use persist::CacheCorrupt;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Weak};
use tokio::sync::Mutex;

use crate::asset::RankedAsset;
use crate::validate::Validator;
use persist::Store;

/// One cached resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub landing_url: String,
    pub assets: Vec<RankedAsset>,
    pub resolved_at: DateTime<Utc>,
}

type FileLock = Arc<Mutex<()>>;

static FILE_LOCKS: LazyLock<std::sync::Mutex<HashMap<PathBuf, Weak<Mutex<()>>>>> =
    LazyLock::new(Default::default);

/// The lock shared by every live handle on `path`.
fn file_lock(path: &Path) -> FileLock {
    let mut locks = FILE_LOCKS.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(lock) = locks.get(path).and_then(Weak::upgrade) {
        return lock;
    }
    locks.retain(|_, weak| weak.strong_count() > 0);
    let lock = FileLock::default();
    locks.insert(path.to_path_buf(), Arc::downgrade(&lock));
    lock
}

pub struct ResolutionCache {
    path: PathBuf,
    lock: FileLock,
}

impl ResolutionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock = file_lock(&path);
        Self { path, lock }
    }

    /// Default location: `~/.cache/pdr/resolution_cache.json`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("pdr")?;
        Ok(xdg_dirs
            .get_cache_home()
            .join("pdr")
            .join("resolution_cache.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_store(&self) -> Store {
        match persist::load(&self.path).await {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!("resolution cache unusable, treating as empty: {}", e);
                Store::new()
            }
        }
    }

    /// Cached entry for `landing_url`. Entries without assets are misses.
    pub async fn get(&self, landing_url: &str) -> Option<CacheEntry> {
        let _guard = self.lock.lock().await;
        self.read_store()
            .await
            .remove(landing_url)
            .filter(|entry| !entry.assets.is_empty())
    }

    /// Stores `assets` for `landing_url`, stamped with the current time.
    pub async fn put(&self, landing_url: &str, assets: Vec<RankedAsset>) -> Result<CacheEntry> {
        let _guard = self.lock.lock().await;
        let mut store = self.read_store().await;
        let entry = CacheEntry {
            landing_url: landing_url.to_string(),
            assets,
            resolved_at: Utc::now(),
        };
        store.insert(landing_url.to_string(), entry.clone());
        persist::save(&self.path, &store).await?;
        tracing::debug!(landing_url, assets = entry.assets.len(), "cached resolution");
        Ok(entry)
    }

    /// Removes one entry, or every entry when `landing_url` is `None`.
    /// Returns how many were removed.
    pub async fn invalidate(&self, landing_url: Option<&str>) -> Result<usize> {
        let _guard = self.lock.lock().await;
        let mut store = self.read_store().await;
        let removed = match landing_url {
            Some(url) => usize::from(store.remove(url).is_some()),
            None => {
                let n = store.len();
                store.clear();
                n
            }
        };
        // Clearing everything also rewrites a corrupt file.
        if removed > 0 || landing_url.is_none() {
            persist::save(&self.path, &store).await?;
        }
        tracing::info!(landing_url = landing_url.unwrap_or("*"), removed, "invalidated cache");
        Ok(removed)
    }

    /// Cached entry, but only after its top-ranked asset re-validates.
    ///
    /// On a failed re-probe the entry is discarded on disk and `None` is
    /// returned so the caller resolves afresh. The probe runs without the
    /// lock held; the discard is skipped if another resolution replaced the
    /// entry in the meantime.
    pub async fn get_trusted(&self, landing_url: &str, validator: &Validator) -> Option<CacheEntry> {
        let mut entry = self.get(landing_url).await?;
        let top = entry.assets.first()?.url.clone();

        let outcome = validator.validate_one(&top).await;
        if outcome.validated {
            entry.assets[0].mark_passed();
            tracing::debug!(landing_url, top = %top, "cache hit revalidated");
            return Some(entry);
        }

        tracing::warn!(
            landing_url,
            top = %top,
            error = ?outcome.error,
            "cached top asset failed revalidation; discarding entry"
        );
        self.discard_if_unchanged(landing_url, entry.resolved_at).await;
        None
    }

    async fn discard_if_unchanged(&self, landing_url: &str, resolved_at: DateTime<Utc>) {
        let _guard = self.lock.lock().await;
        let mut store = self.read_store().await;
        let unchanged = store
            .get(landing_url)
            .is_some_and(|e| e.resolved_at == resolved_at);
        if !unchanged {
            return;
        }
        store.remove(landing_url);
        if let Err(e) = persist::save(&self.path, &store).await {
            tracing::warn!(landing_url, "failed to persist discarded cache entry: {:#}", e);
        }
    }
}
