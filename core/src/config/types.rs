use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tenant used when a request does not carry its own identity.
    #[serde(default = "default_tenant")]
    pub tenant: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub tags: TagsConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub http_server: HttpServerConfig,
}

fn default_tenant() -> String {
    "default".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tenant: default_tenant(),
            logging: LoggingConfig::default(),
            query: QueryConfig::default(),
            cache: CacheConfig::default(),
            tags: TagsConfig::default(),
            source: SourceConfig::default(),
            http_server: HttpServerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "clipseek_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Post-sequence buffer used when a sequence request omits `bufferFrames`.
    #[serde(default = "default_buffer_frames")]
    pub buffer_frames: u32,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on status polls before a job is reported as timed out.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,

    /// Frames recorded before the match timer starts. Log frame numbers are
    /// match frame numbers shifted by this amount.
    #[serde(default = "default_pregame_offset")]
    pub pregame_offset: i64,

    #[serde(default = "default_full_replay_cap")]
    pub full_replay_frame_cap: usize,

    #[serde(default)]
    pub combo: ComboConfig,
}

fn default_buffer_frames() -> u32 {
    120
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_max_polls() -> u32 {
    300
}

fn default_pregame_offset() -> i64 {
    123
}

fn default_full_replay_cap() -> usize {
    10_000
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            buffer_frames: default_buffer_frames(),
            poll_interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
            pregame_offset: default_pregame_offset(),
            full_replay_frame_cap: default_full_replay_cap(),
            combo: ComboConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboConfig {
    #[serde(default = "default_combo_pre")]
    pub pre_buffer: u32,

    #[serde(default = "default_combo_post")]
    pub post_buffer: u32,

    #[serde(default = "default_combo_top_k")]
    pub top_k: usize,

    /// Minimum percent dealt (exclusive) for `damage` combos.
    #[serde(default = "default_damage_threshold")]
    pub damage_threshold: f64,
}

fn default_combo_pre() -> u32 {
    60
}

fn default_combo_post() -> u32 {
    30
}

fn default_combo_top_k() -> usize {
    3
}

fn default_damage_threshold() -> f64 {
    40.0
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            pre_buffer: default_combo_pre(),
            post_buffer: default_combo_post(),
            top_k: default_combo_top_k(),
            damage_threshold: default_damage_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_provider")]
    #[serde(flatten)]
    pub provider: CacheProvider,

    /// Recompute and overwrite a cached stub list in the background after
    /// serving it.
    #[serde(default = "default_refresh_on_hit")]
    pub refresh_on_hit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum CacheProvider {
    #[serde(rename = "fs")]
    Fs(FsCacheConfig),
    #[serde(rename = "memory")]
    Memory(MemoryCacheConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsCacheConfig {
    /// Root directory for cached blobs. Empty means `<data dir>/cache`.
    #[serde(default)]
    pub directory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn default_cache_provider() -> CacheProvider {
    CacheProvider::Fs(FsCacheConfig {
        directory: String::new(),
    })
}

fn default_refresh_on_hit() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    512
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: default_cache_provider(),
            refresh_on_hit: default_refresh_on_hit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagsConfig {
    #[serde(default = "default_tags_provider")]
    #[serde(flatten)]
    pub provider: TagsProvider,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum TagsProvider {
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "file")]
    File(FileTagsConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTagsConfig {
    /// Path of the JSON tag table. Empty means `<data dir>/tags.json`.
    #[serde(default)]
    pub path: String,
}

fn default_tags_provider() -> TagsProvider {
    TagsProvider::File(FileTagsConfig {
        path: String::new(),
    })
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            provider: default_tags_provider(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding one sub-directory of recorded match files per tenant.
    #[serde(default)]
    pub data_dir: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_dir: "./matches".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_host")]
    pub host: String,

    #[serde(default = "default_http_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
