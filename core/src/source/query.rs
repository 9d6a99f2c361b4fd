use serde::{Deserialize, Serialize};

use super::types::{
    FrameRange, FrameRecord, ItemRow, MatchSettings, PlatformRow, PlayerFrameRow, PlayerSettings,
    PunishRow, StateTable,
};
use crate::error::QueryError;

/// A structured request against the frame log.
///
/// Queries carry typed parameters only; engines never receive caller text to
/// splice into their own query language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogQuery {
    StateTable,
    StateFrames {
        match_id: Option<String>,
    },
    MatchSettings {
        match_id: Option<String>,
    },
    PlayerSettings {
        match_id: Option<String>,
    },
    Punishes {
        match_id: Option<String>,
    },
    PlayerFrames {
        match_id: String,
        range: Option<FrameRange>,
        /// Keep at most this many distinct frames (lowest frame numbers first).
        frame_limit: Option<usize>,
    },
    ItemFrames {
        match_id: String,
        range: Option<FrameRange>,
        type_ids: Vec<u16>,
    },
    PlatformFrames {
        match_id: String,
        range: Option<FrameRange>,
    },
}

impl LogQuery {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StateTable => "state_table",
            Self::StateFrames { .. } => "state_frames",
            Self::MatchSettings { .. } => "match_settings",
            Self::PlayerSettings { .. } => "player_settings",
            Self::Punishes { .. } => "punishes",
            Self::PlayerFrames { .. } => "player_frames",
            Self::ItemFrames { .. } => "item_frames",
            Self::PlatformFrames { .. } => "platform_frames",
        }
    }
}

/// Result rows of a finished job. The variant always mirrors the submitted
/// [`LogQuery`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum LogRows {
    StateTable(StateTable),
    StateFrames(Vec<FrameRecord>),
    MatchSettings(Vec<MatchSettings>),
    PlayerSettings(Vec<PlayerSettings>),
    Punishes(Vec<PunishRow>),
    PlayerFrames(Vec<PlayerFrameRow>),
    ItemFrames(Vec<ItemRow>),
    PlatformFrames(Vec<PlatformRow>),
}

impl LogRows {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StateTable(_) => "state_table",
            Self::StateFrames(_) => "state_frames",
            Self::MatchSettings(_) => "match_settings",
            Self::PlayerSettings(_) => "player_settings",
            Self::Punishes(_) => "punishes",
            Self::PlayerFrames(_) => "player_frames",
            Self::ItemFrames(_) => "item_frames",
            Self::PlatformFrames(_) => "platform_frames",
        }
    }
}

macro_rules! rows_accessor {
    ($fn_name:ident, $variant:ident, $ty:ty, $expected:literal) => {
        impl LogRows {
            pub fn $fn_name(self, job_id: &str) -> Result<$ty, QueryError> {
                match self {
                    Self::$variant(rows) => Ok(rows),
                    other => Err(QueryError::UnexpectedRows {
                        job_id: job_id.to_string(),
                        expected: $expected,
                        got: other.kind(),
                    }),
                }
            }
        }
    };
}

rows_accessor!(into_state_table, StateTable, StateTable, "state_table");
rows_accessor!(into_state_frames, StateFrames, Vec<FrameRecord>, "state_frames");
rows_accessor!(into_match_settings, MatchSettings, Vec<MatchSettings>, "match_settings");
rows_accessor!(into_player_settings, PlayerSettings, Vec<PlayerSettings>, "player_settings");
rows_accessor!(into_punishes, Punishes, Vec<PunishRow>, "punishes");
rows_accessor!(into_player_frames, PlayerFrames, Vec<PlayerFrameRow>, "player_frames");
rows_accessor!(into_item_frames, ItemFrames, Vec<ItemRow>, "item_frames");
rows_accessor!(into_platform_frames, PlatformFrames, Vec<PlatformRow>, "platform_frames");
