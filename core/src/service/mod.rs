//! Request orchestration: log jobs, matching, ranking, caching and tags.

mod replay;
mod request;
mod stubs;

use std::sync::Arc;

use tracing::warn;

use crate::cache::{BackgroundTasks, CacheKey, ResultCache};
use crate::config::{AppConfig, QueryConfig};
use crate::context::Services;
use crate::source::JobRunner;
use crate::tags::TagEnricher;

pub use request::{QueryPlan, QueryRequest, ReplayRequest, TagUpdate, TagUpdateResponse};
pub use stubs::CacheStatus;

/// Shared, cheaply clonable service handle.
#[derive(Clone)]
pub struct QueryService {
    runner: JobRunner,
    cache: Arc<dyn ResultCache>,
    tags: TagEnricher,
    tasks: BackgroundTasks,
    config: Arc<QueryConfig>,
    refresh_on_hit: bool,
}

impl QueryService {
    pub fn new(services: Services, cfg: &AppConfig) -> Self {
        Self {
            runner: JobRunner::from_config(services.source, &cfg.query),
            cache: services.cache,
            tags: TagEnricher::new(services.tags),
            tasks: BackgroundTasks::new(),
            config: Arc::new(cfg.query.clone()),
            refresh_on_hit: cfg.cache.refresh_on_hit,
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Supervisor of background cache refreshes.
    pub fn background(&self) -> &BackgroundTasks {
        &self.tasks
    }

    pub fn tags(&self) -> &TagEnricher {
        &self.tags
    }

    /// Cache read where backend failures count as a miss.
    async fn cached(&self, key: &CacheKey) -> Option<Vec<u8>> {
        match self.cache.get(key).await {
            Ok(entry) => entry.map(|e| e.payload),
            Err(err) => {
                warn!(
                    target: "clipseek.cache",
                    cache = self.cache.name(),
                    key = %key,
                    error = %err,
                    "cache read failed, treating as miss"
                );
                None
            }
        }
    }

    async fn store(&self, key: &CacheKey, payload: Vec<u8>) {
        if let Err(err) = self.cache.put(key, payload).await {
            warn!(
                target: "clipseek.cache",
                cache = self.cache.name(),
                key = %key,
                error = %err,
                "cache write failed"
            );
        }
    }
}
