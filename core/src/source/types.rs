//! Row shapes produced by the frame log. Frame numbers are the log's own;
//! clip bounds use them unchanged and replay fetches add the pre-game offset.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

pub type FrameNumber = i64;
pub type EntityId = u8;

/// One entity's state on one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRecord {
    pub match_id: String,
    pub entity_id: EntityId,
    pub frame_number: FrameNumber,
    pub state_id: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, f64>,
}

impl FrameRecord {
    pub fn new(
        match_id: &str,
        entity_id: EntityId,
        frame_number: FrameNumber,
        state_id: u16,
    ) -> Self {
        Self {
            match_id: match_id.to_string(),
            entity_id,
            frame_number,
            state_id,
            attributes: BTreeMap::new(),
        }
    }
}

/// Lookup from numeric action-state ids to state names.
///
/// Several ids may share one name (e.g. forward and backward jumps are both
/// `JUMP`); runs are built over names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateTable {
    names: HashMap<u16, String>,
}

impl StateTable {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u16, S)>,
        S: Into<String>,
    {
        Self {
            names: entries.into_iter().map(|(id, n)| (id, n.into())).collect(),
        }
    }

    /// Resolved name, or `#<id>` for ids missing from the table.
    pub fn name_of(&self, id: u16) -> Cow<'_, str> {
        match self.names.get(&id) {
            Some(name) => Cow::Borrowed(name.as_str()),
            None => Cow::Owned(format!("#{id}")),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSettings {
    pub match_id: String,
    #[serde(default)]
    pub replay_format_version: String,
    pub stage_id: u16,
    #[serde(default)]
    pub timer_start: u32,
    /// Match length in match frames.
    pub frame_count: FrameNumber,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSettings {
    pub match_id: String,
    pub player_index: EntityId,
    #[serde(default)]
    pub port: u8,
    pub character_id: u16,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub connect_code: String,
}

/// A precomputed punish (combo) interval for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PunishRow {
    pub match_id: String,
    pub entity_id: EntityId,
    pub start_frame: FrameNumber,
    pub end_frame: FrameNumber,
    pub num_moves: u32,
    pub start_pct: f64,
    pub end_pct: f64,
    #[serde(default)]
    pub stocks: Option<u8>,
}

impl PunishRow {
    pub fn damage(&self) -> f64 {
        self.end_pct - self.start_pct
    }
}

/// Raw per-player frame row as recorded by the replay parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerFrameRow {
    pub match_id: String,
    pub frame_number: FrameNumber,
    pub player_index: EntityId,
    pub follower: bool,
    pub seed: u32,
    pub buttons: u16,
    pub phys_l: f32,
    pub phys_r: f32,
    pub joy_x: f32,
    pub joy_y: f32,
    pub c_x: f32,
    pub c_y: f32,
    pub char_id: u8,
    pub action_state: u16,
    pub pos_x: f32,
    pub pos_y: f32,
    pub face_dir: f32,
    pub percent: f32,
    pub shield: f32,
    pub hit_with: u8,
    pub combo: u8,
    pub hurt_by: u8,
    pub stocks: u8,
    pub action_frame: f32,
    pub hitstun: f32,
    pub airborne: bool,
    pub ground_id: u16,
    pub jumps: u8,
    pub l_cancel: u8,
    pub hurtbox: u8,
    pub self_air_x: f32,
    pub self_air_y: f32,
    pub attack_x: f32,
    pub attack_y: f32,
    pub self_ground_x: f32,
    pub hitlag: f32,
    pub alive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemRow {
    pub match_id: String,
    pub frame_number: FrameNumber,
    pub type_id: u16,
    pub state: u8,
    pub facing_direction: f32,
    pub x_velocity: f32,
    pub y_velocity: f32,
    pub x_position: f32,
    pub y_position: f32,
    pub spawn_id: u32,
    pub owner: i8,
    pub missile_type: u8,
    pub turnip_face: u8,
    pub charge_level: u8,
}

/// Fountain of Dreams platform heights for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlatformRow {
    pub match_id: String,
    pub frame_number: FrameNumber,
    pub left_height: f32,
    pub right_height: f32,
}

/// Inclusive range of log frame numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: FrameNumber,
    pub end: FrameNumber,
}

impl FrameRange {
    pub fn contains(&self, frame: FrameNumber) -> bool {
        frame >= self.start && frame <= self.end
    }
}
