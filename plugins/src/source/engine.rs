//! Asynchronous job engine over recorded match files.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use clipseek_core::api::{FrameLogSource, JobId, JobStatus, LogQuery, LogRows, TenantId};

use super::dataset::{answer, query_match_id, Dataset};

enum JobSlot {
    Running,
    Done(LogRows),
    Failed(String),
}

struct Job {
    tenant: TenantId,
    slot: JobSlot,
}

/// Each submitted query runs on its own task; status and results are looked
/// up by job id. A job is dropped once its results are handed out or its
/// failure has been reported.
#[derive(Clone)]
pub struct LocalLogEngine {
    dataset: Arc<Dataset>,
    jobs: Arc<Mutex<HashMap<String, Job>>>,
}

impl LocalLogEngine {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn execute(dataset: &Dataset, tenant: &TenantId, query: &LogQuery) -> Result<LogRows> {
        let states = match query {
            LogQuery::StateTable => Some(dataset.state_table().await?),
            _ => None,
        };
        let logs = match query {
            LogQuery::StateTable => Vec::new(),
            _ => dataset.load(tenant, query_match_id(query)).await?,
        };
        Ok(answer(query, logs, states))
    }

    fn job_for<'a>(
        jobs: &'a mut HashMap<String, Job>,
        tenant: &TenantId,
        job: &JobId,
    ) -> Result<&'a mut Job> {
        match jobs.get_mut(&job.0) {
            Some(entry) if &entry.tenant == tenant => Ok(entry),
            _ => Err(anyhow!("unknown job {job}")),
        }
    }
}

#[async_trait]
impl FrameLogSource for LocalLogEngine {
    fn name(&self) -> &str {
        "local"
    }

    async fn submit(&self, tenant: &TenantId, query: LogQuery) -> Result<JobId> {
        let id = Uuid::new_v4().to_string();
        self.jobs.lock().await.insert(
            id.clone(),
            Job {
                tenant: tenant.clone(),
                slot: JobSlot::Running,
            },
        );
        tracing::debug!(target: "clipseek.engine", job = %id, kind = query.kind(), tenant = %tenant, "job submitted");

        let dataset = self.dataset.clone();
        let jobs = self.jobs.clone();
        let tenant = tenant.clone();
        let job_id = id.clone();
        tokio::spawn(async move {
            let slot = match Self::execute(&dataset, &tenant, &query).await {
                Ok(rows) => JobSlot::Done(rows),
                Err(err) => {
                    tracing::warn!(target: "clipseek.engine", job = %job_id, error = %err, "job failed");
                    JobSlot::Failed(format!("{err:#}"))
                }
            };
            if let Some(job) = jobs.lock().await.get_mut(&job_id) {
                job.slot = slot;
            }
        });
        Ok(JobId(id))
    }

    async fn status(&self, tenant: &TenantId, job: &JobId) -> Result<JobStatus> {
        let mut jobs = self.jobs.lock().await;
        match Self::job_for(&mut jobs, tenant, job)?.slot {
            JobSlot::Running => return Ok(JobStatus::Running),
            JobSlot::Done(_) => return Ok(JobStatus::Succeeded),
            JobSlot::Failed(_) => {}
        }
        // A failure is reported once; there are no results to collect.
        match jobs.remove(&job.0).map(|j| j.slot) {
            Some(JobSlot::Failed(reason)) => Ok(JobStatus::Failed { reason }),
            _ => Err(anyhow!("job {job} vanished while reporting failure")),
        }
    }

    async fn results(&self, tenant: &TenantId, job: &JobId) -> Result<LogRows> {
        let mut jobs = self.jobs.lock().await;
        Self::job_for(&mut jobs, tenant, job)?;
        match jobs.remove(&job.0).map(|j| j.slot) {
            Some(JobSlot::Done(rows)) => Ok(rows),
            Some(JobSlot::Running) | None => Err(anyhow!("job {job} has no results yet")),
            Some(JobSlot::Failed(reason)) => Err(anyhow!("job {job} failed: {reason}")),
        }
    }

    async fn release(&self, tenant: &TenantId, job: &JobId) {
        let mut jobs = self.jobs.lock().await;
        if Self::job_for(&mut jobs, tenant, job).is_ok() {
            jobs.remove(&job.0);
            tracing::debug!(target: "clipseek.engine", job = %job, "job released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::dataset::{MatchLog, STATE_TABLE_FILE};
    use clipseek_core::api::{JobRunner, MatchSettings, QueryError};
    use std::time::Duration;

    fn write_match(root: &std::path::Path, tenant: &str, match_id: &str) {
        let dir = root.join(tenant);
        std::fs::create_dir_all(&dir).unwrap();
        let log = MatchLog {
            settings: MatchSettings {
                match_id: match_id.into(),
                replay_format_version: "3.16.0".into(),
                stage_id: 8,
                timer_start: 480,
                frame_count: 3_600,
            },
            players: vec![],
            state_frames: vec![],
            punishes: vec![],
            player_frames: vec![],
            items: vec![],
            platforms: vec![],
        };
        let bytes = serde_json::to_vec(&log).unwrap();
        std::fs::write(dir.join(format!("{match_id}.json")), bytes).unwrap();
    }

    fn runner(engine: LocalLogEngine) -> JobRunner {
        JobRunner::new(Arc::new(engine), Duration::from_millis(1), 1_000)
    }

    #[tokio::test]
    async fn answers_queries_per_tenant() {
        let dir = tempfile::tempdir().unwrap();
        write_match(dir.path(), "acme", "m1");
        write_match(dir.path(), "acme", "m2");
        write_match(dir.path(), "other", "m3");
        std::fs::write(dir.path().join(STATE_TABLE_FILE), r#"{"253":"CLIFF_WAIT"}"#).unwrap();

        let runner = runner(LocalLogEngine::new(Dataset::new(dir.path())));
        let acme = TenantId::parse("acme").unwrap();

        let all = runner.match_settings(&acme, None).await.unwrap();
        let ids: Vec<_> = all.iter().map(|s| s.match_id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);

        let one = runner.match_settings(&acme, Some("m3".into())).await.unwrap();
        assert!(one.is_empty());

        let states = runner.state_table(&acme).await.unwrap();
        assert_eq!(states.name_of(253), "CLIFF_WAIT");
    }

    #[tokio::test]
    async fn corrupt_files_fail_the_job_with_a_reason() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("acme")).unwrap();
        std::fs::write(dir.path().join("acme").join("bad.json"), "{not json").unwrap();

        let runner = runner(LocalLogEngine::new(Dataset::new(dir.path())));
        let acme = TenantId::parse("acme").unwrap();
        match runner.punishes(&acme, None).await.unwrap_err() {
            QueryError::JobFailed { reason } => assert!(reason.contains("bad.json")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_jobs_are_released() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("acme")).unwrap();
        std::fs::write(dir.path().join("acme").join("bad.json"), "{not json").unwrap();

        let engine = LocalLogEngine::new(Dataset::new(dir.path()));
        let runner = runner(engine.clone());
        let acme = TenantId::parse("acme").unwrap();
        for _ in 0..5 {
            assert!(runner.punishes(&acme, None).await.is_err());
        }
        assert!(engine.jobs.lock().await.is_empty());
    }

    #[tokio::test]
    async fn released_jobs_stay_gone() {
        let dir = tempfile::tempdir().unwrap();
        write_match(dir.path(), "acme", "m1");
        let engine = LocalLogEngine::new(Dataset::new(dir.path()));
        let acme = TenantId::parse("acme").unwrap();
        let other = TenantId::parse("other").unwrap();

        let job = engine.submit(&acme, LogQuery::Punishes { match_id: None }).await.unwrap();
        engine.release(&other, &job).await;
        assert_eq!(engine.jobs.lock().await.len(), 1);

        engine.release(&acme, &job).await;
        // The spawned task finishing afterwards must not bring the entry back.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(engine.jobs.lock().await.is_empty());
        assert!(engine.status(&acme, &job).await.is_err());
    }

    #[tokio::test]
    async fn jobs_are_invisible_to_other_tenants() {
        let dir = tempfile::tempdir().unwrap();
        let engine = LocalLogEngine::new(Dataset::new(dir.path()));
        let acme = TenantId::parse("acme").unwrap();
        let other = TenantId::parse("other").unwrap();
        let job = engine.submit(&acme, LogQuery::StateTable).await.unwrap();
        assert!(engine.status(&other, &job).await.is_err());
        assert!(engine.status(&acme, &job).await.is_ok());
    }
}
