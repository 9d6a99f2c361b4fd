use std::collections::{BTreeSet, HashMap};

use futures::try_join;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::request::{QueryPlan, QueryRequest, TagUpdate, TagUpdateResponse};
use super::QueryService;
use crate::cache::CacheKey;
use crate::combo::{rank_combos, ComboMode};
use crate::error::QueryError;
use crate::sequence::{group_entity_logs, SequenceMatcher, SequenceSpec};
use crate::source::{FrameNumber, MatchSettings, PlayerSettings};
use crate::stub::{Clip, ComboStats, EntityMeta, ReplayStub};
use crate::tags::TagKey;
use crate::tenant::TenantId;
use crate::window::{resolve, WindowBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
        }
    }
}

/// Per-match metadata needed to turn spans into clips.
struct MatchIndex {
    settings: HashMap<String, MatchSettings>,
    players: HashMap<String, Vec<EntityMeta>>,
}

impl MatchIndex {
    fn new(settings: Vec<MatchSettings>, players: Vec<PlayerSettings>) -> Self {
        let mut by_match: HashMap<String, Vec<EntityMeta>> = HashMap::new();
        for player in &players {
            by_match
                .entry(player.match_id.clone())
                .or_default()
                .push(EntityMeta::from(player));
        }
        for list in by_match.values_mut() {
            list.sort_by_key(|p| p.player_index);
        }
        Self {
            settings: settings.into_iter().map(|s| (s.match_id.clone(), s)).collect(),
            players: by_match,
        }
    }

    fn ensure_known(&self, match_id: Option<&str>) -> Result<(), QueryError> {
        match match_id {
            Some(id) if !self.settings.contains_key(id) => {
                Err(QueryError::NotFound(format!("match with id '{id}' not found")))
            }
            _ => Ok(()),
        }
    }

    /// Clip for a span given in match frames, or `None` without settings.
    fn clip(
        &self,
        match_id: &str,
        start: FrameNumber,
        end: FrameNumber,
        buffer: WindowBuffer,
    ) -> Option<Clip> {
        let Some(settings) = self.settings.get(match_id) else {
            warn!(target: "clipseek.query", match_id, "no match settings, dropping result");
            return None;
        };
        let window = resolve(start, end, settings.frame_count, buffer);
        Some(Clip {
            match_id: match_id.to_string(),
            frame_start: window.frame_start,
            frame_end: window.frame_end,
            stage_id: settings.stage_id,
            players: self.players.get(match_id).cloned().unwrap_or_default(),
        })
    }
}

impl QueryService {
    /// Serialized stubs for `request`, served stale-while-revalidate.
    ///
    /// A hit returns the cached bytes unchanged and, when enabled, schedules a
    /// background recompute that overwrites the entry.
    pub async fn query_payload(
        &self,
        tenant: &TenantId,
        request: QueryRequest,
    ) -> Result<(Vec<u8>, CacheStatus), QueryError> {
        let plan = request.plan(&self.config)?;
        let key = CacheKey::stubs(plan.kind(), tenant, &plan, plan.match_id())?;

        if let Some(payload) = self.cached(&key).await {
            debug!(target: "clipseek.cache", key = %key, bytes = payload.len(), "cache hit");
            if self.refresh_on_hit {
                self.spawn_refresh(tenant.clone(), plan, key);
            }
            return Ok((payload, CacheStatus::Hit));
        }

        let stubs = self.compute(tenant, &plan).await?;
        let payload = serde_json::to_vec(&stubs)?;
        self.store(&key, payload.clone()).await;
        info!(target: "clipseek.query", key = %key, stubs = stubs.len(), "computed stubs");
        Ok((payload, CacheStatus::Miss))
    }

    pub async fn query(
        &self,
        tenant: &TenantId,
        request: QueryRequest,
    ) -> Result<Vec<ReplayStub>, QueryError> {
        let (payload, _) = self.query_payload(tenant, request).await?;
        Ok(serde_json::from_slice(&payload)?)
    }

    fn spawn_refresh(&self, tenant: TenantId, plan: QueryPlan, key: CacheKey) {
        let service = self.clone();
        self.tasks.spawn(format!("refresh {key}"), async move {
            let stubs = service.compute(&tenant, &plan).await?;
            let payload = serde_json::to_vec(&stubs)?;
            service.cache.put(&key, payload).await?;
            debug!(target: "clipseek.cache", key = %key, stubs = stubs.len(), "cache refreshed");
            Ok(())
        });
    }

    /// Run the query against the log and tag the results. Never touches the
    /// result cache.
    pub async fn compute(
        &self,
        tenant: &TenantId,
        plan: &QueryPlan,
    ) -> Result<Vec<ReplayStub>, QueryError> {
        let mut stubs = match plan {
            QueryPlan::Sequence {
                spec,
                buffer_frames,
                match_id,
            } => self.compute_sequence(tenant, spec, *buffer_frames, match_id.clone()).await?,
            QueryPlan::Combo { mode, match_id } => {
                self.compute_combo(tenant, *mode, match_id.clone()).await?
            }
        };
        self.tags.enrich(tenant, &mut stubs).await;
        Ok(stubs)
    }

    async fn compute_sequence(
        &self,
        tenant: &TenantId,
        spec: &SequenceSpec,
        buffer_frames: u32,
        match_id: Option<String>,
    ) -> Result<Vec<ReplayStub>, QueryError> {
        let (states, frames, settings, players) = try_join!(
            self.runner.state_table(tenant),
            self.runner.state_frames(tenant, match_id.clone()),
            self.runner.match_settings(tenant, match_id.clone()),
            self.runner.player_settings(tenant, match_id.clone()),
        )?;
        let index = MatchIndex::new(settings, players);
        index.ensure_known(match_id.as_deref())?;

        let logs = group_entity_logs(frames);
        let chains = SequenceMatcher::new(spec, &states).match_logs(&logs);
        debug!(target: "clipseek.sequence", entities = logs.len(), chains = chains.len(), "matched");

        let buffer = WindowBuffer::for_sequence(buffer_frames);
        let mut seen = BTreeSet::new();
        let mut stubs: Vec<ReplayStub> = chains
            .into_iter()
            .filter(|c| seen.insert((c.match_id.clone(), c.sequence_start, c.sequence_end)))
            .filter_map(|c| index.clip(&c.match_id, c.sequence_start, c.sequence_end, buffer))
            .map(ReplayStub::new)
            .collect();
        stubs.sort_by(|a, b| {
            (a.clip.match_id.as_str(), a.clip.frame_start)
                .cmp(&(b.clip.match_id.as_str(), b.clip.frame_start))
        });
        Ok(stubs)
    }

    async fn compute_combo(
        &self,
        tenant: &TenantId,
        mode: ComboMode,
        match_id: Option<String>,
    ) -> Result<Vec<ReplayStub>, QueryError> {
        let (punishes, settings, players) = try_join!(
            self.runner.punishes(tenant, match_id.clone()),
            self.runner.match_settings(tenant, match_id.clone()),
            self.runner.player_settings(tenant, match_id.clone()),
        )?;
        let index = MatchIndex::new(settings, players);
        index.ensure_known(match_id.as_deref())?;

        let combo = &self.config.combo;
        let buffer = WindowBuffer::fixed(combo.pre_buffer, combo.post_buffer);
        let stubs = rank_combos(punishes, mode, combo)
            .iter()
            .filter_map(|row| {
                index
                    .clip(&row.match_id, row.start_frame, row.end_frame, buffer)
                    .map(|clip| ReplayStub::new(clip).with_combo(ComboStats::from(row)))
            })
            .collect();
        Ok(stubs)
    }

    /// Write the `bugged` tag of one stub and return the stored value.
    pub async fn set_bugged(
        &self,
        tenant: &TenantId,
        update: TagUpdate,
    ) -> Result<TagUpdateResponse, QueryError> {
        let (match_id, frame_start, frame_end, bugged) = update.validate()?;
        let key = TagKey::new(tenant.clone(), &match_id, frame_start, frame_end);
        let stored = self.tags.set_bugged(&key, bugged).await?;
        info!(target: "clipseek.tags", match_id = %match_id, frame_start, frame_end, bugged = stored, "tag updated");
        Ok(TagUpdateResponse { bugged: stored })
    }
}
