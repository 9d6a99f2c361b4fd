#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use clipseek_core::api::{
    AppConfig, CacheEntry, CacheKey, FrameLogSource, FrameRecord, ItemRow, JobId, JobStatus,
    LogQuery, LogRows, MatchSettings, PlatformRow, PlayerFrameRow, PlayerSettings, PunishRow,
    QueryService, ResultCache, Services, StateTable, StoreError, TagKey, TagStore, TenantId,
};

pub const CLIFF_WAIT: u16 = 253;
pub const FALL: u16 = 29;
pub const JUMP_F: u16 = 25;
pub const JUMP_B: u16 = 26;
pub const AIR_DODGE: u16 = 236;
pub const WAIT: u16 = 14;

/// Recorded log data for a handful of matches.
#[derive(Default, Clone)]
pub struct Dataset {
    pub states: StateTable,
    pub state_frames: Vec<FrameRecord>,
    pub settings: Vec<MatchSettings>,
    pub players: Vec<PlayerSettings>,
    pub punishes: Vec<PunishRow>,
    pub player_frames: Vec<PlayerFrameRow>,
    pub items: Vec<ItemRow>,
    pub platforms: Vec<PlatformRow>,
}

impl Dataset {
    /// One match `m1` where player 1 ledge-dashes at log frames 500..=513.
    pub fn ledge_dash() -> Self {
        let states = StateTable::new([
            (WAIT, "WAIT"),
            (CLIFF_WAIT, "CLIFF_WAIT"),
            (FALL, "FALL"),
            (JUMP_F, "JUMP"),
            (JUMP_B, "JUMP"),
            (AIR_DODGE, "AIR_DODGE"),
        ]);
        let segments = [
            (WAIT, 480),
            (CLIFF_WAIT, 8),
            (FALL, 2),
            (JUMP_F, 2),
            (JUMP_B, 1),
            (AIR_DODGE, 1),
            (WAIT, 100),
        ];
        let mut state_frames = Vec::new();
        let mut frame = 20;
        for (state, len) in segments {
            for _ in 0..len {
                state_frames.push(FrameRecord::new("m1", 1, frame, state));
                frame += 1;
            }
        }
        for f in 0..600 {
            state_frames.push(FrameRecord::new("m1", 0, f, WAIT));
        }
        Self {
            states,
            state_frames,
            settings: vec![MatchSettings {
                match_id: "m1".into(),
                replay_format_version: "3.16.0".into(),
                stage_id: 31,
                timer_start: 480,
                frame_count: 9_000,
            }],
            players: vec![player("m1", 1, "Zain"), player("m1", 0, "Mango")],
            ..Default::default()
        }
    }

    pub fn with_player_frames(mut self, frames: impl IntoIterator<Item = i64>) -> Self {
        for frame in frames {
            for index in [1u8, 0] {
                self.player_frames.push(PlayerFrameRow {
                    match_id: "m1".into(),
                    frame_number: frame,
                    player_index: index,
                    seed: 7,
                    alive: true,
                    ..Default::default()
                });
            }
        }
        self
    }
}

pub fn player(match_id: &str, index: u8, tag: &str) -> PlayerSettings {
    PlayerSettings {
        match_id: match_id.into(),
        player_index: index,
        port: index + 1,
        character_id: 20,
        tag: tag.into(),
        connect_code: format!("{}#0", tag.to_uppercase()),
    }
}

/// Log source answering from a [`Dataset`]. Jobs can be held or failed.
#[derive(Default)]
pub struct FixtureSource {
    pub data: Mutex<Dataset>,
    pub submits: AtomicUsize,
    pub hold: AtomicBool,
    pub fail: AtomicBool,
    jobs: Mutex<HashMap<String, LogQuery>>,
}

impl FixtureSource {
    pub fn new(data: Dataset) -> Self {
        Self {
            data: Mutex::new(data),
            ..Default::default()
        }
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    fn answer(&self, query: &LogQuery) -> LogRows {
        let data = self.data.lock().unwrap();
        let same = |m: &Option<String>, id: &str| m.as_deref().map_or(true, |m| m == id);
        match query {
            LogQuery::StateTable => LogRows::StateTable(data.states.clone()),
            LogQuery::StateFrames { match_id } => LogRows::StateFrames(
                data.state_frames.iter().filter(|f| same(match_id, &f.match_id)).cloned().collect(),
            ),
            LogQuery::MatchSettings { match_id } => LogRows::MatchSettings(
                data.settings.iter().filter(|s| same(match_id, &s.match_id)).cloned().collect(),
            ),
            LogQuery::PlayerSettings { match_id } => LogRows::PlayerSettings(
                data.players.iter().filter(|p| same(match_id, &p.match_id)).cloned().collect(),
            ),
            LogQuery::Punishes { match_id } => LogRows::Punishes(
                data.punishes.iter().filter(|p| same(match_id, &p.match_id)).cloned().collect(),
            ),
            LogQuery::PlayerFrames { match_id, range, frame_limit } => {
                let mut rows: Vec<_> = data
                    .player_frames
                    .iter()
                    .filter(|r| {
                        &r.match_id == match_id
                            && range.map_or(true, |g| g.contains(r.frame_number))
                    })
                    .cloned()
                    .collect();
                rows.sort_by_key(|r| r.frame_number);
                if let Some(limit) = frame_limit {
                    let mut distinct: Vec<i64> = rows.iter().map(|r| r.frame_number).collect();
                    distinct.dedup();
                    if let Some(last) = distinct.get(limit.saturating_sub(1)) {
                        let last = *last;
                        rows.retain(|r| r.frame_number <= last);
                    }
                }
                LogRows::PlayerFrames(rows)
            }
            LogQuery::ItemFrames { match_id, range, type_ids } => LogRows::ItemFrames(
                data.items
                    .iter()
                    .filter(|r| {
                        &r.match_id == match_id
                            && type_ids.contains(&r.type_id)
                            && range.map_or(true, |g| g.contains(r.frame_number))
                    })
                    .cloned()
                    .collect(),
            ),
            LogQuery::PlatformFrames { match_id, range } => LogRows::PlatformFrames(
                data.platforms
                    .iter()
                    .filter(|r| {
                        &r.match_id == match_id
                            && range.map_or(true, |g| g.contains(r.frame_number))
                    })
                    .cloned()
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl FrameLogSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn submit(&self, _tenant: &TenantId, query: LogQuery) -> anyhow::Result<JobId> {
        let n = self.submits.fetch_add(1, Ordering::SeqCst);
        let id = format!("job-{n}");
        self.jobs.lock().unwrap().insert(id.clone(), query);
        Ok(JobId(id))
    }

    async fn status(&self, _tenant: &TenantId, _job: &JobId) -> anyhow::Result<JobStatus> {
        if self.fail.load(Ordering::SeqCst) {
            return Ok(JobStatus::Failed {
                reason: "HIVE_CURSOR_ERROR".into(),
            });
        }
        if self.hold.load(Ordering::SeqCst) {
            return Ok(JobStatus::Running);
        }
        Ok(JobStatus::Succeeded)
    }

    async fn results(&self, _tenant: &TenantId, job: &JobId) -> anyhow::Result<LogRows> {
        let query = self
            .jobs
            .lock()
            .unwrap()
            .get(&job.0)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown job {job}"))?;
        Ok(self.answer(&query))
    }
}

#[derive(Default)]
pub struct MapCache {
    pub entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    pub writes: AtomicUsize,
}

impl MapCache {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultCache for MapCache {
    fn name(&self) -> &str {
        "map"
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &CacheKey, payload: Vec<u8>) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().unwrap().insert(
            key.clone(),
            CacheEntry {
                key: key.clone(),
                payload,
                written_at: Utc::now(),
            },
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct MapTags {
    pub tags: Mutex<HashMap<(String, String), bool>>,
}

#[async_trait]
impl TagStore for MapTags {
    fn name(&self) -> &str {
        "map"
    }

    async fn get_tag(&self, key: &TagKey, tag: &str) -> Result<Option<bool>, StoreError> {
        Ok(self.tags.lock().unwrap().get(&(key.storage_key(), tag.to_string())).copied())
    }

    async fn set_tag(&self, key: &TagKey, tag: &str, value: bool) -> Result<bool, StoreError> {
        self.tags.lock().unwrap().insert((key.storage_key(), tag.to_string()), value);
        Ok(value)
    }
}

pub struct Harness {
    pub source: Arc<FixtureSource>,
    pub cache: Arc<MapCache>,
    pub tags: Arc<MapTags>,
    pub service: QueryService,
    pub tenant: TenantId,
}

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.query.poll_interval_ms = 1;
    cfg.query.max_polls = 5_000;
    cfg
}

pub fn harness(data: Dataset) -> Harness {
    harness_with(data, test_config())
}

pub fn harness_with(data: Dataset, cfg: AppConfig) -> Harness {
    let source = Arc::new(FixtureSource::new(data));
    let cache = Arc::new(MapCache::default());
    let tags = Arc::new(MapTags::default());
    let services = Services {
        source: source.clone(),
        cache: cache.clone(),
        tags: tags.clone(),
    };
    Harness {
        source,
        cache,
        tags,
        service: QueryService::new(services, &cfg),
        tenant: TenantId::parse("acme").unwrap(),
    }
}
