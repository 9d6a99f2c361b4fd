//! `ServicesFactory` implementation: builds the log source, result cache and
//! tag store from config so the CLI and the HTTP server share one wiring.
use async_trait::async_trait;
use clipseek_core::api::{AppConfig, QueryError, Services, ServicesFactory};

use crate::factory;

pub struct PluginServicesFactory;

impl Default for PluginServicesFactory {
    fn default() -> Self {
        Self
    }
}

#[async_trait]
impl ServicesFactory for PluginServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, QueryError> {
        let source = factory::build_source(cfg);
        let cache = factory::build_cache(cfg);
        let tags = factory::build_tags(cfg);
        tracing::debug!(
            target: "clipseek.services",
            source = source.name(),
            cache = cache.name(),
            tags = tags.name(),
            "services built"
        );
        Ok(Services {
            source,
            cache,
            tags,
        })
    }
}
