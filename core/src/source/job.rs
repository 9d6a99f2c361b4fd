//! Submit / poll / collect driver for log queries.

use std::sync::Arc;
use std::time::Duration;

use super::query::{LogQuery, LogRows};
use super::traits::{FrameLogSource, JobId, JobStatus};
use super::types::{
    FrameRange, FrameRecord, ItemRow, MatchSettings, PlatformRow, PlayerFrameRow, PlayerSettings,
    PunishRow, StateTable,
};
use crate::config::QueryConfig;
use crate::error::QueryError;
use crate::tenant::TenantId;

/// Lifecycle of one job as seen by the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Submitted { job: JobId },
    Polling { job: JobId, attempt: u32 },
    Succeeded { job: JobId },
    Failed { job: JobId, reason: String },
}

impl JobState {
    fn job(&self) -> &JobId {
        match self {
            Self::Submitted { job }
            | Self::Polling { job, .. }
            | Self::Succeeded { job }
            | Self::Failed { job, .. } => job,
        }
    }
}

/// Drives a job through `Submitted -> Polling -> {Succeeded, Failed}`.
///
/// Polling is bounded by `max_polls`; a failed job is never retried.
#[derive(Clone)]
pub struct JobRunner {
    source: Arc<dyn FrameLogSource>,
    poll_interval: Duration,
    max_polls: u32,
}

impl JobRunner {
    pub fn new(source: Arc<dyn FrameLogSource>, poll_interval: Duration, max_polls: u32) -> Self {
        Self {
            source,
            poll_interval,
            max_polls: max_polls.max(1),
        }
    }

    pub fn from_config(source: Arc<dyn FrameLogSource>, cfg: &QueryConfig) -> Self {
        Self::new(
            source,
            Duration::from_millis(cfg.poll_interval_ms),
            cfg.max_polls,
        )
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub async fn run(&self, tenant: &TenantId, query: LogQuery) -> Result<LogRows, QueryError> {
        self.run_job(tenant, query).await.map(|(_, rows)| rows)
    }

    #[tracing::instrument(
        name = "job.run",
        skip(self, query),
        fields(kind = query.kind(), tenant = %tenant)
    )]
    async fn run_job(
        &self,
        tenant: &TenantId,
        query: LogQuery,
    ) -> Result<(JobId, LogRows), QueryError> {
        let kind = query.kind();
        let job = self
            .source
            .submit(tenant, query)
            .await
            .map_err(QueryError::Source)?;
        tracing::debug!(target: "clipseek.job", job = %job, kind, "submitted");

        let mut state = JobState::Submitted { job };
        loop {
            state = match state {
                JobState::Submitted { job } => JobState::Polling { job, attempt: 0 },
                JobState::Polling { job, attempt } => {
                    if attempt >= self.max_polls {
                        tracing::warn!(target: "clipseek.job", job = %job, polls = attempt, "poll budget exhausted");
                        self.source.release(tenant, &job).await;
                        return Err(QueryError::JobTimeout {
                            job_id: job.0,
                            polls: attempt,
                        });
                    }
                    tokio::time::sleep(self.poll_interval).await;
                    let status = self
                        .source
                        .status(tenant, &job)
                        .await
                        .map_err(QueryError::Source)?;
                    match status {
                        JobStatus::Queued | JobStatus::Running => JobState::Polling {
                            job,
                            attempt: attempt + 1,
                        },
                        JobStatus::Succeeded => JobState::Succeeded { job },
                        JobStatus::Failed { reason } => JobState::Failed { job, reason },
                    }
                }
                JobState::Succeeded { job } => {
                    let rows = self
                        .source
                        .results(tenant, &job)
                        .await
                        .map_err(QueryError::Source)?;
                    if rows.kind() != kind {
                        return Err(QueryError::UnexpectedRows {
                            job_id: job.0,
                            expected: kind,
                            got: rows.kind(),
                        });
                    }
                    tracing::debug!(target: "clipseek.job", job = %job, kind, "succeeded");
                    return Ok((job, rows));
                }
                JobState::Failed { job, reason } => {
                    tracing::error!(target: "clipseek.job", job = %job, kind, reason = %reason, "failed");
                    self.source.release(tenant, &job).await;
                    return Err(QueryError::JobFailed { reason });
                }
            };
            tracing::trace!(target: "clipseek.job", job = %state.job(), ?state, "transition");
        }
    }
}

macro_rules! typed_fetch {
    (
        $(#[$doc:meta])*
        $name:ident($($arg:ident: $arg_ty:ty),*) -> $ty:ty,
        $query:expr,
        $accessor:ident
    ) => {
        impl JobRunner {
            $(#[$doc])*
            pub async fn $name(
                &self,
                tenant: &TenantId
                $(, $arg: $arg_ty)*
            ) -> Result<$ty, QueryError> {
                let (job, rows) = self.run_job(tenant, $query).await?;
                rows.$accessor(&job.0)
            }
        }
    };
}

typed_fetch!(state_table() -> StateTable, LogQuery::StateTable, into_state_table);
typed_fetch!(
    /// Every state frame of the match, or of every match when `match_id` is `None`.
    state_frames(match_id: Option<String>) -> Vec<FrameRecord>,
    LogQuery::StateFrames { match_id },
    into_state_frames
);
typed_fetch!(
    match_settings(match_id: Option<String>) -> Vec<MatchSettings>,
    LogQuery::MatchSettings { match_id },
    into_match_settings
);
typed_fetch!(
    player_settings(match_id: Option<String>) -> Vec<PlayerSettings>,
    LogQuery::PlayerSettings { match_id },
    into_player_settings
);
typed_fetch!(
    punishes(match_id: Option<String>) -> Vec<PunishRow>,
    LogQuery::Punishes { match_id },
    into_punishes
);
typed_fetch!(
    player_frames(
        match_id: String,
        range: Option<FrameRange>,
        frame_limit: Option<usize>
    ) -> Vec<PlayerFrameRow>,
    LogQuery::PlayerFrames { match_id, range, frame_limit },
    into_player_frames
);
typed_fetch!(
    item_frames(match_id: String, range: Option<FrameRange>, type_ids: Vec<u16>) -> Vec<ItemRow>,
    LogQuery::ItemFrames { match_id, range, type_ids },
    into_item_frames
);
typed_fetch!(
    platform_frames(match_id: String, range: Option<FrameRange>) -> Vec<PlatformRow>,
    LogQuery::PlatformFrames { match_id, range },
    into_platform_frames
);
