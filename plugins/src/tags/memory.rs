use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use clipseek_core::api::{StoreError, TagKey, TagStore};
use clipseek_core::tags::tag_attribute;

#[derive(Default)]
pub struct MemoryTagStore {
    tags: Mutex<HashMap<(String, String), bool>>,
}

impl MemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TagStore for MemoryTagStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_tag(&self, key: &TagKey, tag: &str) -> Result<Option<bool>, StoreError> {
        let tags = self
            .tags
            .lock()
            .map_err(|_| StoreError::Backend("tag store lock poisoned".into()))?;
        Ok(tags.get(&(key.storage_key(), tag_attribute(tag))).copied())
    }

    async fn set_tag(&self, key: &TagKey, tag: &str, value: bool) -> Result<bool, StoreError> {
        let mut tags = self
            .tags
            .lock()
            .map_err(|_| StoreError::Backend("tag store lock poisoned".into()))?;
        tags.insert((key.storage_key(), tag_attribute(tag)), value);
        Ok(value)
    }
}
