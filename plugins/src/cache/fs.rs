//! Result cache storing one file per key under a root directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use clipseek_core::api::{CacheEntry, CacheKey, ResultCache, StoreError};

pub struct FsResultCache {
    root: PathBuf,
}

impl FsResultCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        key.segments().fold(self.root.clone(), |path, seg| path.join(seg))
    }
}

fn io_error(key: &CacheKey, source: std::io::Error) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        source,
    }
}

#[async_trait]
impl ResultCache for FsResultCache {
    fn name(&self) -> &str {
        "fs"
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError> {
        let path = self.path_for(key);
        let payload = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(key, err)),
        };
        let written_at = tokio::fs::metadata(&path)
            .await
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Ok(Some(CacheEntry {
            key: key.clone(),
            payload,
            written_at,
        }))
    }

    async fn put(&self, key: &CacheKey, payload: Vec<u8>) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(key, e))?;
        }
        // Write then rename so readers never see a partial payload.
        let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, &payload)
            .await
            .map_err(|e| io_error(key, e))?;
        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_error(key, err));
        }
        tracing::debug!(target: "clipseek.cache", key = %key, bytes = payload.len(), "cache entry written");
        Ok(())
    }
}
