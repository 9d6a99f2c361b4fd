//! Client-side review session: browsing, filtering and tagging stubs of one
//! tenant.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::assemble::ReplayData;
use crate::error::QueryError;
use crate::presets::Category;
use crate::service::{QueryRequest, QueryService, ReplayRequest, TagUpdate, TagUpdateResponse};
use crate::source::FrameNumber;
use crate::stub::{ReplayStub, StubFilter};
use crate::tenant::TenantId;

/// What a session talks to: the local service or a remote API client.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn stubs(
        &self,
        tenant: &TenantId,
        request: QueryRequest,
    ) -> Result<Vec<ReplayStub>, QueryError>;
    async fn replay(
        &self,
        tenant: &TenantId,
        request: ReplayRequest,
    ) -> Result<ReplayData, QueryError>;
    async fn set_tag(
        &self,
        tenant: &TenantId,
        update: TagUpdate,
    ) -> Result<TagUpdateResponse, QueryError>;
}

#[async_trait]
impl SessionBackend for QueryService {
    async fn stubs(
        &self,
        tenant: &TenantId,
        request: QueryRequest,
    ) -> Result<Vec<ReplayStub>, QueryError> {
        self.query(tenant, request).await
    }

    async fn replay(
        &self,
        tenant: &TenantId,
        request: ReplayRequest,
    ) -> Result<ReplayData, QueryError> {
        QueryService::replay(self, tenant, request).await
    }

    async fn set_tag(
        &self,
        tenant: &TenantId,
        update: TagUpdate,
    ) -> Result<TagUpdateResponse, QueryError> {
        self.set_bugged(tenant, update).await
    }
}

type StubId = (String, FrameNumber, FrameNumber);

fn stub_id(stub: &ReplayStub) -> StubId {
    (stub.clip.match_id.clone(), stub.clip.frame_start, stub.clip.frame_end)
}

pub struct ReviewSession {
    backend: Arc<dyn SessionBackend>,
    tenant: TenantId,
    buffer_frames: u32,
    category: Option<Category>,
    stubs: Vec<ReplayStub>,
    filter: StubFilter,
    selected: Option<StubId>,
    full_replay: bool,
    replays: HashMap<StubId, Arc<ReplayData>>,
}

impl ReviewSession {
    pub fn new(backend: Arc<dyn SessionBackend>, tenant: TenantId, buffer_frames: u32) -> Self {
        Self {
            backend,
            tenant,
            buffer_frames,
            category: None,
            stubs: Vec::new(),
            filter: StubFilter::default(),
            selected: None,
            full_replay: false,
            replays: HashMap::new(),
        }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn full_replay(&self) -> bool {
        self.full_replay
    }

    pub fn cached_replays(&self) -> usize {
        self.replays.len()
    }

    /// Load the stubs of `category`. Switching category drops cached replays
    /// and the selection.
    pub async fn load_category(&mut self, category: Category) -> Result<usize, QueryError> {
        let request = category.request(self.buffer_frames, None);
        let stubs = self.backend.stubs(&self.tenant, request).await?;
        if self.category != Some(category) {
            self.replays.clear();
        }
        self.category = Some(category);
        self.stubs = stubs;
        self.selected = None;
        debug!(target: "clipseek.session", category = category.slug(), stubs = self.stubs.len(), "category loaded");
        Ok(self.stubs.len())
    }

    /// Start over under another tenant.
    pub fn switch_tenant(&mut self, tenant: TenantId) {
        self.tenant = tenant;
        self.category = None;
        self.stubs.clear();
        self.selected = None;
        self.replays.clear();
    }

    pub fn set_filter(&mut self, filter: StubFilter) {
        self.filter = filter;
    }

    pub fn toggle_full_replay(&mut self) -> bool {
        self.full_replay = !self.full_replay;
        self.replays.clear();
        self.full_replay
    }

    /// Filtered stubs, bugged ones last.
    pub fn visible(&self) -> Vec<&ReplayStub> {
        let mut visible: Vec<&ReplayStub> =
            self.stubs.iter().filter(|s| self.filter.matches(s)).collect();
        visible.sort_by_key(|s| s.bugged);
        visible
    }

    pub fn selected(&self) -> Option<&ReplayStub> {
        let selected = self.selected.as_ref()?;
        self.stubs.iter().find(|s| stub_id(s) == *selected)
    }

    pub async fn select(
        &mut self,
        match_id: &str,
        frame_start: FrameNumber,
        frame_end: FrameNumber,
    ) -> Result<Arc<ReplayData>, QueryError> {
        let id = (match_id.to_string(), frame_start, frame_end);
        let data = match self.replays.get(&id) {
            Some(data) => data.clone(),
            None => {
                let range = (!self.full_replay).then_some((frame_start, frame_end));
                let data = Arc::new(
                    self.backend
                        .replay(&self.tenant, ReplayRequest::new(match_id, range))
                        .await?,
                );
                self.replays.insert(id.clone(), data.clone());
                data
            }
        };
        self.selected = Some(id);
        Ok(data)
    }

    pub async fn next(&mut self) -> Result<Option<Arc<ReplayData>>, QueryError> {
        self.step(1).await
    }

    pub async fn previous(&mut self) -> Result<Option<Arc<ReplayData>>, QueryError> {
        self.step(-1).await
    }

    async fn step(&mut self, delta: isize) -> Result<Option<Arc<ReplayData>>, QueryError> {
        let Some(selected) = self.selected.clone() else {
            return Ok(None);
        };
        let target = {
            let visible = self.visible();
            let Some(current) = visible.iter().position(|s| stub_id(s) == selected) else {
                return Ok(None);
            };
            current
                .checked_add_signed(delta)
                .and_then(|i| visible.get(i))
                .map(|s| stub_id(s))
        };
        match target {
            Some((match_id, start, end)) => self.select(&match_id, start, end).await.map(Some),
            None => Ok(None),
        }
    }

    /// Flip `bugged` locally, persist it, and keep the stored value. A failed
    /// write restores the previous value and returns the error.
    pub async fn toggle_bugged(
        &mut self,
        match_id: &str,
        frame_start: FrameNumber,
        frame_end: FrameNumber,
    ) -> Result<bool, QueryError> {
        let id = (match_id.to_string(), frame_start, frame_end);
        let position = self
            .stubs
            .iter()
            .position(|s| stub_id(s) == id)
            .ok_or_else(|| {
                QueryError::NotFound(format!("no stub {match_id} {frame_start}..{frame_end}"))
            })?;

        let previous = self.stubs[position].bugged;
        let requested = !previous;
        self.stubs[position].bugged = requested;

        let update = TagUpdate::new(match_id, frame_start, frame_end, requested);
        match self.backend.set_tag(&self.tenant, update).await {
            Ok(response) => {
                self.stubs[position].bugged = response.bugged;
                Ok(response.bugged)
            }
            Err(err) => {
                warn!(target: "clipseek.session", match_id, frame_start, frame_end, error = %err, "tag write failed, reverting");
                self.stubs[position].bugged = previous;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{GameEnding, ReplaySettings};
    use crate::source::MatchSettings;
    use crate::stub::{Clip, EntityMeta};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBackend {
        replay_calls: AtomicUsize,
        full_requests: AtomicUsize,
        fail_tags: AtomicBool,
        stub_requests: Mutex<Vec<QueryRequest>>,
    }

    fn stub(match_id: &str, start: FrameNumber, stage: u16, tag: &str) -> ReplayStub {
        ReplayStub::new(Clip {
            match_id: match_id.into(),
            frame_start: start,
            frame_end: start + 100,
            stage_id: stage,
            players: vec![EntityMeta {
                player_index: 0,
                character_id: 20,
                tag: tag.into(),
                connect_code: format!("{}#1", tag.to_uppercase()),
            }],
        })
    }

    #[async_trait]
    impl SessionBackend for FakeBackend {
        async fn stubs(
            &self,
            _tenant: &TenantId,
            request: QueryRequest,
        ) -> Result<Vec<ReplayStub>, QueryError> {
            self.stub_requests.lock().unwrap().push(request);
            Ok(vec![stub("a", 0, 2, "amsa"), stub("b", 50, 31, "zain"), stub("c", 10, 2, "zain")])
        }

        async fn replay(
            &self,
            _tenant: &TenantId,
            request: ReplayRequest,
        ) -> Result<ReplayData, QueryError> {
            self.replay_calls.fetch_add(1, Ordering::SeqCst);
            if request.frame_start.is_none() {
                self.full_requests.fetch_add(1, Ordering::SeqCst);
            }
            let match_id = request.match_id.unwrap_or_default();
            Ok(ReplayData {
                settings: ReplaySettings::new(
                    MatchSettings {
                        match_id,
                        replay_format_version: "3.16.0".into(),
                        stage_id: 2,
                        timer_start: 480,
                        frame_count: 9_000,
                    },
                    vec![],
                ),
                frames: vec![],
                ending: GameEnding::default(),
                warning: None,
                gaps: vec![],
            })
        }

        async fn set_tag(
            &self,
            _tenant: &TenantId,
            update: TagUpdate,
        ) -> Result<TagUpdateResponse, QueryError> {
            if self.fail_tags.load(Ordering::SeqCst) {
                let err = crate::error::StoreError::Backend("unavailable".into());
                return Err(QueryError::Tag(err));
            }
            Ok(TagUpdateResponse {
                bugged: update.bugged.unwrap_or_default(),
            })
        }
    }

    fn session(backend: Arc<FakeBackend>) -> ReviewSession {
        ReviewSession::new(backend, TenantId::parse("acme").unwrap(), 120)
    }

    fn ids(session: &ReviewSession) -> Vec<&str> {
        session.visible().iter().map(|s| s.match_id()).collect()
    }

    #[tokio::test]
    async fn replays_are_cached_until_scope_changes() {
        let backend = Arc::new(FakeBackend::default());
        let mut session = session(backend.clone());
        session.load_category(Category::LedgeDashes).await.unwrap();

        session.select("a", 0, 100).await.unwrap();
        session.select("a", 0, 100).await.unwrap();
        assert_eq!(backend.replay_calls.load(Ordering::SeqCst), 1);

        session.load_category(Category::LedgeDashes).await.unwrap();
        session.select("a", 0, 100).await.unwrap();
        assert_eq!(backend.replay_calls.load(Ordering::SeqCst), 1);

        session.load_category(Category::ShineGrabs).await.unwrap();
        assert_eq!(session.cached_replays(), 0);
        session.select("a", 0, 100).await.unwrap();
        assert_eq!(backend.replay_calls.load(Ordering::SeqCst), 2);

        assert!(session.toggle_full_replay());
        assert_eq!(session.cached_replays(), 0);
        session.select("a", 0, 100).await.unwrap();
        assert_eq!(backend.full_requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn filters_and_navigation_skip_bugged_to_the_end() {
        let backend = Arc::new(FakeBackend::default());
        let mut session = session(backend);
        session.load_category(Category::CombosLength).await.unwrap();
        assert_eq!(ids(&session), vec!["a", "b", "c"]);

        session.toggle_bugged("a", 0, 100).await.unwrap();
        assert_eq!(ids(&session), vec!["b", "c", "a"]);

        session.select("b", 50, 150).await.unwrap();
        session.next().await.unwrap().unwrap();
        assert_eq!(session.selected().unwrap().match_id(), "c");
        session.next().await.unwrap().unwrap();
        assert_eq!(session.selected().unwrap().match_id(), "a");
        assert!(session.next().await.unwrap().is_none());
        session.previous().await.unwrap().unwrap();
        assert_eq!(session.selected().unwrap().match_id(), "c");

        session.set_filter(StubFilter { stages: vec![2], names: vec!["ZAIN#1".into()] });
        assert_eq!(ids(&session), vec!["c"]);
    }

    #[tokio::test]
    async fn failed_tag_write_rolls_back() {
        let backend = Arc::new(FakeBackend::default());
        let mut session = session(backend.clone());
        session.load_category(Category::LedgeDashes).await.unwrap();

        backend.fail_tags.store(true, Ordering::SeqCst);
        assert!(session.toggle_bugged("b", 50, 150).await.is_err());
        assert!(session.visible().iter().all(|s| !s.bugged));

        backend.fail_tags.store(false, Ordering::SeqCst);
        assert!(session.toggle_bugged("b", 50, 150).await.unwrap());
        assert!(!session.toggle_bugged("b", 50, 150).await.unwrap());
    }

    #[tokio::test]
    async fn switching_tenant_resets_state() {
        let backend = Arc::new(FakeBackend::default());
        let mut session = session(backend.clone());
        session.load_category(Category::CombosDamage).await.unwrap();
        session.select("c", 10, 110).await.unwrap();

        session.switch_tenant(TenantId::parse("other").unwrap());
        assert!(session.visible().is_empty());
        assert!(session.selected().is_none());
        assert_eq!(session.cached_replays(), 0);
        assert_eq!(session.category(), None);
        assert_eq!(backend.stub_requests.lock().unwrap().len(), 1);
    }
}
