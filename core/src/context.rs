use crate::cache::ResultCache;
use crate::config::AppConfig;
use crate::error::QueryError;
use crate::service::QueryService;
use crate::source::FrameLogSource;
use crate::tags::TagStore;
use crate::tenant::TenantId;
use std::sync::Arc;

#[derive(Clone)]
pub struct Services {
    pub source: Arc<dyn FrameLogSource>,
    pub cache: Arc<dyn ResultCache>,
    pub tags: Arc<dyn TagStore>,
}

#[async_trait::async_trait]
pub trait ServicesFactory: Send + Sync {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, QueryError>;
}

#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    services_factory: Option<Arc<dyn ServicesFactory>>,
}

impl AppContext {
    pub fn new(cfg: AppConfig, services_factory: Option<Arc<dyn ServicesFactory>>) -> Self {
        Self {
            cfg,
            services_factory,
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn with_config(&self, cfg: AppConfig) -> Self {
        Self {
            cfg,
            services_factory: self.services_factory.clone(),
        }
    }

    /// Tenant used when a caller does not name one.
    pub fn default_tenant(&self) -> Result<TenantId, QueryError> {
        TenantId::parse(&self.cfg.tenant)
            .map_err(|e| QueryError::Config(format!("invalid configured tenant: {e}")))
    }

    pub async fn build_services(&self, cfg: &AppConfig) -> Result<Services, QueryError> {
        let Some(factory) = self.services_factory.as_ref() else {
            return Err(QueryError::Config(
                "services_factory missing (cannot build plugins/services)".into(),
            ));
        };
        factory.build_services(cfg).await
    }

    pub async fn query_service(&self) -> Result<QueryService, QueryError> {
        let services = self.build_services(&self.cfg).await?;
        Ok(QueryService::new(services, &self.cfg))
    }
}
