//! On-disk layout of recorded matches.
//!
//! ```text
//! {data_dir}/states.json              state id -> name
//! {data_dir}/{tenant}/{match_id}.json one MatchLog per match
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use clipseek_core::api::{
    FrameRange, FrameRecord, ItemRow, LogQuery, LogRows, MatchSettings, PlatformRow,
    PlayerFrameRow, PlayerSettings, PunishRow, StateTable, TenantId,
};

pub const STATE_TABLE_FILE: &str = "states.json";

/// Everything recorded for one match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchLog {
    pub settings: MatchSettings,
    #[serde(default)]
    pub players: Vec<PlayerSettings>,
    #[serde(default)]
    pub state_frames: Vec<FrameRecord>,
    #[serde(default)]
    pub punishes: Vec<PunishRow>,
    #[serde(default)]
    pub player_frames: Vec<PlayerFrameRow>,
    #[serde(default)]
    pub items: Vec<ItemRow>,
    #[serde(default)]
    pub platforms: Vec<PlatformRow>,
}

impl MatchLog {
    pub fn match_id(&self) -> &str {
        &self.settings.match_id
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    root: PathBuf,
}

impl Dataset {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn tenant_dir(&self, tenant: &TenantId) -> PathBuf {
        self.root.join(tenant.as_str())
    }

    /// Match ids are used as file names; anything that could leave the
    /// tenant directory is rejected.
    fn match_path(&self, tenant: &TenantId, match_id: &str) -> Option<PathBuf> {
        let safe = !match_id.is_empty()
            && !match_id.starts_with('.')
            && !match_id.contains(['/', '\\']);
        safe.then(|| self.tenant_dir(tenant).join(format!("{match_id}.json")))
    }

    pub async fn state_table(&self) -> Result<StateTable> {
        let path = self.root.join(STATE_TABLE_FILE);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let names: HashMap<u16, String> = serde_json::from_slice(&bytes)
                    .with_context(|| format!("invalid state table {}", path.display()))?;
                Ok(StateTable::new(names))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(target: "clipseek.engine", path = %path.display(), "state table missing, names will be numeric");
                Ok(StateTable::default())
            }
            Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    /// One match, or every match of the tenant. Unknown matches yield nothing.
    pub async fn load(&self, tenant: &TenantId, match_id: Option<&str>) -> Result<Vec<MatchLog>> {
        let paths = match match_id {
            Some(id) => self.match_path(tenant, id).into_iter().collect(),
            None => self.list(tenant).await?,
        };
        let mut logs = Vec::with_capacity(paths.len());
        for path in paths {
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    let log: MatchLog = serde_json::from_slice(&bytes)
                        .with_context(|| format!("invalid match log {}", path.display()))?;
                    logs.push(log);
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(err).with_context(|| format!("failed to read {}", path.display()))
                }
            }
        }
        logs.sort_by(|a, b| a.match_id().cmp(b.match_id()));
        Ok(logs)
    }

    async fn list(&self, tenant: &TenantId) -> Result<Vec<PathBuf>> {
        let dir = self.tenant_dir(tenant);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to list {}", dir.display()))
            }
        };
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

fn in_range(range: &Option<FrameRange>, frame: i64) -> bool {
    range.map_or(true, |r| r.contains(frame))
}

/// Evaluate `query` over already loaded matches.
pub fn answer(query: &LogQuery, logs: Vec<MatchLog>, states: Option<StateTable>) -> LogRows {
    match query {
        LogQuery::StateTable => LogRows::StateTable(states.unwrap_or_default()),
        LogQuery::StateFrames { .. } => {
            LogRows::StateFrames(logs.into_iter().flat_map(|l| l.state_frames).collect())
        }
        LogQuery::MatchSettings { .. } => {
            LogRows::MatchSettings(logs.into_iter().map(|l| l.settings).collect())
        }
        LogQuery::PlayerSettings { .. } => {
            LogRows::PlayerSettings(logs.into_iter().flat_map(|l| l.players).collect())
        }
        LogQuery::Punishes { .. } => {
            LogRows::Punishes(logs.into_iter().flat_map(|l| l.punishes).collect())
        }
        LogQuery::PlayerFrames {
            range, frame_limit, ..
        } => {
            let mut rows: Vec<PlayerFrameRow> = logs
                .into_iter()
                .flat_map(|l| l.player_frames)
                .filter(|r| in_range(range, r.frame_number))
                .collect();
            rows.sort_by_key(|r| (r.frame_number, r.player_index));
            if let Some(limit) = *frame_limit {
                let mut distinct = 0usize;
                let mut last = None;
                rows.retain(|r| {
                    if last != Some(r.frame_number) {
                        last = Some(r.frame_number);
                        distinct += 1;
                    }
                    distinct <= limit
                });
            }
            LogRows::PlayerFrames(rows)
        }
        LogQuery::ItemFrames {
            range, type_ids, ..
        } => {
            let mut rows: Vec<ItemRow> = logs
                .into_iter()
                .flat_map(|l| l.items)
                .filter(|r| in_range(range, r.frame_number) && type_ids.contains(&r.type_id))
                .collect();
            rows.sort_by_key(|r| r.frame_number);
            LogRows::ItemFrames(rows)
        }
        LogQuery::PlatformFrames { range, .. } => {
            let mut rows: Vec<PlatformRow> = logs
                .into_iter()
                .flat_map(|l| l.platforms)
                .filter(|r| in_range(range, r.frame_number))
                .collect();
            rows.sort_by_key(|r| r.frame_number);
            LogRows::PlatformFrames(rows)
        }
    }
}

/// Match scope of a query, if it names one.
pub fn query_match_id(query: &LogQuery) -> Option<&str> {
    match query {
        LogQuery::StateTable => None,
        LogQuery::StateFrames { match_id }
        | LogQuery::MatchSettings { match_id }
        | LogQuery::PlayerSettings { match_id }
        | LogQuery::Punishes { match_id } => match_id.as_deref(),
        LogQuery::PlayerFrames { match_id, .. }
        | LogQuery::ItemFrames { match_id, .. }
        | LogQuery::PlatformFrames { match_id, .. } => Some(match_id.as_str()),
    }
}
