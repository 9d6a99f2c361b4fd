//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `clipseek_core::api` instead of reaching into internal modules.

pub use crate::assemble::{
    assemble_frames, Assembled, Buttons, FrameGap, FrameObject, GameEnding, PlayerFrame,
    ReplayData, ReplaySettings, TRACKED_ITEM_TYPES,
};
pub use crate::cache::{BackgroundTasks, CacheEntry, CacheKey, ResultCache};
pub use crate::combo::{rank_combos, ComboMode};
pub use crate::config::{
    get_clipseek_data_dir, load_default, load_from_path, AppConfig, CacheConfig, CacheProvider,
    ComboConfig, FileTagsConfig, FsCacheConfig, HttpServerConfig, LoggingConfig,
    MemoryCacheConfig, QueryConfig, SourceConfig, TagsConfig, TagsProvider,
};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::error::{CliError, QueryError, StoreError};
pub use crate::presets::Category;
pub use crate::sequence::{Chain, Run, SequenceMatcher, SequenceSpec, SequenceStep};
pub use crate::service::{
    CacheStatus, QueryPlan, QueryRequest, QueryService, ReplayRequest, TagUpdate,
    TagUpdateResponse,
};
pub use crate::session::{ReviewSession, SessionBackend};
pub use crate::source::{
    EntityId, FrameLogSource, FrameNumber, FrameRange, FrameRecord, ItemRow, JobId, JobRunner,
    JobStatus, LogQuery, LogRows, MatchSettings, PlatformRow, PlayerFrameRow, PlayerSettings,
    PunishRow, StateTable,
};
pub use crate::stub::{bugged_last, Clip, ComboStats, EntityMeta, ReplayStub, StubFilter};
pub use crate::tags::{TagEnricher, TagKey, TagStore, BUGGED_TAG};
pub use crate::tenant::TenantId;
pub use crate::window::{resolve, Window, WindowBuffer};
