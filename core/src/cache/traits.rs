use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::key::CacheKey;
use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: CacheKey,
    pub payload: Vec<u8>,
    pub written_at: DateTime<Utc>,
}

/// Opaque payload store. Entries never expire; `put` overwrites.
#[async_trait]
pub trait ResultCache: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` on a miss. Errors are reserved for backend failures.
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError>;

    async fn put(&self, key: &CacheKey, payload: Vec<u8>) -> Result<(), StoreError>;
}
