use async_trait::async_trait;

use super::key::TagKey;
use crate::error::StoreError;

/// Boolean tags attached to stubs.
#[async_trait]
pub trait TagStore: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when the tag was never written.
    async fn get_tag(&self, key: &TagKey, tag: &str) -> Result<Option<bool>, StoreError>;

    /// Write the tag and return the value now stored.
    async fn set_tag(&self, key: &TagKey, tag: &str, value: bool) -> Result<bool, StoreError>;
}
