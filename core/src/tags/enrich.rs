use std::sync::Arc;

use futures::future::join_all;
use tracing::warn;

use super::key::{TagKey, BUGGED_TAG};
use super::traits::TagStore;
use crate::stub::ReplayStub;
use crate::tenant::TenantId;

/// Fills in `bugged` on stubs. Lookups run concurrently and fail open.
#[derive(Clone)]
pub struct TagEnricher {
    store: Arc<dyn TagStore>,
}

impl TagEnricher {
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TagStore> {
        &self.store
    }

    pub async fn is_bugged(&self, key: &TagKey) -> bool {
        match self.store.get_tag(key, BUGGED_TAG).await {
            Ok(value) => value.unwrap_or(false),
            Err(err) => {
                warn!(
                    target: "clipseek.tags",
                    store = self.store.name(),
                    match_id = %key.match_id,
                    frame_start = key.frame_start,
                    frame_end = key.frame_end,
                    error = %err,
                    "tag read failed, treating stub as not bugged"
                );
                false
            }
        }
    }

    pub async fn enrich(&self, tenant: &TenantId, stubs: &mut [ReplayStub]) {
        let lookups = stubs.iter().map(|stub| {
            let key = TagKey::new(
                tenant.clone(),
                &stub.clip.match_id,
                stub.clip.frame_start,
                stub.clip.frame_end,
            );
            async move { self.is_bugged(&key).await }
        });
        let flags = join_all(lookups).await;
        for (stub, bugged) in stubs.iter_mut().zip(flags) {
            stub.bugged = bugged;
        }
    }

    /// Store-backed update; errors surface to the caller.
    pub async fn set_bugged(
        &self,
        key: &TagKey,
        bugged: bool,
    ) -> Result<bool, crate::error::StoreError> {
        self.store.set_tag(key, BUGGED_TAG, bugged).await
    }
}
