use chrono::{DateTime, Local};
use clipseek_core::api::{AppConfig, QueryService, TenantId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: QueryService,
    /// Tenant used when a request carries no `x-tenant-id` header.
    pub default_tenant: TenantId,
    pub config: Arc<AppConfig>,
    pub stats: Arc<RwLock<ServerStats>>,
}

impl AppState {
    pub fn new(service: QueryService, default_tenant: TenantId, config: AppConfig) -> Self {
        Self {
            service,
            default_tenant,
            config: Arc::new(config),
            stats: Arc::new(RwLock::new(ServerStats::new())),
        }
    }

    pub fn record_request(&self, endpoint: &str) {
        if let Ok(mut stats) = self.stats.write() {
            stats.increment_request(endpoint);
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut stats) = self.stats.write() {
            stats.increment_error();
        }
    }
}

pub struct ServerStats {
    pub requests_total: u64,
    pub requests_by_endpoint: HashMap<String, u64>,
    pub errors_total: u64,
    pub start_time: DateTime<Local>,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            requests_total: 0,
            requests_by_endpoint: HashMap::new(),
            errors_total: 0,
            start_time: Local::now(),
        }
    }

    pub fn increment_request(&mut self, endpoint: &str) {
        self.requests_total += 1;
        *self
            .requests_by_endpoint
            .entry(endpoint.to_string())
            .or_insert(0) += 1;
    }

    pub fn increment_error(&mut self) {
        self.errors_total += 1;
    }

    pub fn uptime_seconds(&self) -> f64 {
        let now = Local::now();
        (now - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}
