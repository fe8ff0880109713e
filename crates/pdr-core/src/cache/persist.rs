//! On-disk form of the resolution cache: one JSON object keyed by landing URL.
//!
//! Loading is lenient. Entries that fail to parse are skipped one by one, and
//! assets without a URL are dropped. Saving writes a uniquely named sibling
//! temporary file and renames it over the target.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::CacheEntry;
use crate::asset::RankedAsset;

/// Persisted cache state that could not be used.
#[derive(Debug, thiserror::Error)]
pub enum CacheCorrupt {
    #[error("read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{}: top-level value is not an object", .path.display())]
    NotAnObject { path: PathBuf },
}

pub(crate) type Store = BTreeMap<String, CacheEntry>;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedEntry {
    #[serde(default)]
    assets: Vec<RankedAsset>,
    #[serde(default)]
    resolved_at: Option<DateTime<Utc>>,
}

/// Reads the store. A missing file is an empty store.
pub(crate) async fn load(path: &Path) -> Result<Store, CacheCorrupt> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Store::new()),
        Err(source) => {
            return Err(CacheCorrupt::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|source| CacheCorrupt::Json {
            path: path.to_path_buf(),
            source,
        })?;
    let serde_json::Value::Object(map) = value else {
        return Err(CacheCorrupt::NotAnObject {
            path: path.to_path_buf(),
        });
    };

    let mut store = Store::new();
    for (landing_url, raw) in map {
        match serde_json::from_value::<PersistedEntry>(raw) {
            Ok(persisted) => {
                let assets: Vec<RankedAsset> = persisted
                    .assets
                    .into_iter()
                    .filter(|a| !a.url.is_empty())
                    .collect();
                let entry = CacheEntry {
                    landing_url: landing_url.clone(),
                    assets,
                    resolved_at: persisted.resolved_at.unwrap_or_default(),
                };
                store.insert(landing_url, entry);
            }
            Err(e) => {
                tracing::warn!(landing_url = %landing_url, "skipping unreadable cache entry: {}", e);
            }
        }
    }
    Ok(store)
}

/// Replaces the file at `path` with `store`.
pub(crate) async fn save(path: &Path, store: &Store) -> anyhow::Result<()> {
    use anyhow::Context;

    let persisted: BTreeMap<&str, PersistedEntry> = store
        .iter()
        .map(|(url, entry)| {
            (
                url.as_str(),
                PersistedEntry {
                    assets: entry.assets.clone(),
                    resolved_at: Some(entry.resolved_at),
                },
            )
        })
        .collect();
    let json = serde_json::to_vec_pretty(&persisted).context("serialize resolution cache")?;

    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_atomic(&target, &json))
        .await
        .context("resolution cache write task")?
}

/// Writes `bytes` to a uniquely named sibling and renames it over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    use anyhow::Context;
    use std::io::Write;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).with_context(|| format!("create dir: {}", dir.display()))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".resolution_cache.")
        .suffix(".tmp")
        .tempfile_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("write resolution cache: {}", tmp.path().display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replace resolution cache: {}", path.display()))?;
    Ok(())
}
