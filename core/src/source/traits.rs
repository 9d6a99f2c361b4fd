use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::query::{LogQuery, LogRows};
use crate::tenant::TenantId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status reported by the engine for a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed { reason: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed { .. })
    }
}

/// An asynchronous analytic engine over recorded frame logs.
///
/// Every call is scoped by tenant: an implementation must never read or
/// expose rows that belong to another tenant, and job ids are only valid for
/// the tenant that submitted them.
#[async_trait]
pub trait FrameLogSource: Send + Sync {
    fn name(&self) -> &str;
    async fn submit(&self, tenant: &TenantId, query: LogQuery) -> anyhow::Result<JobId>;
    async fn status(&self, tenant: &TenantId, job: &JobId) -> anyhow::Result<JobStatus>;
    /// Rows of a job whose status is [`JobStatus::Succeeded`].
    async fn results(&self, tenant: &TenantId, job: &JobId) -> anyhow::Result<LogRows>;
    /// Drops whatever the engine still holds for a job the caller gave up
    /// on, whether it failed or ran out of polls. Unknown jobs are ignored.
    async fn release(&self, _tenant: &TenantId, _job: &JobId) {}
}
