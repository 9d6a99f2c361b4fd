//! Viewer-facing frame objects built from raw log rows.

use serde::{Deserialize, Serialize};

use crate::source::{
    EntityId, FrameNumber, ItemRow, MatchSettings, PlatformRow, PlayerFrameRow, PlayerSettings,
};

/// Item type ids forwarded to the viewer (projectiles, turnips, Samus/Link
/// items and similar). Everything else is dropped.
pub const TRACKED_ITEM_TYPES: [u16; 11] = [79, 54, 55, 99, 86, 105, 48, 95, 93, 94, 210];

/// Controller buttons as stored in the packed `buttons` column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buttons {
    pub d_pad_left: bool,
    pub d_pad_right: bool,
    pub d_pad_down: bool,
    pub d_pad_up: bool,
    pub z: bool,
    pub r_trigger_digital: bool,
    pub l_trigger_digital: bool,
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub y: bool,
    pub start: bool,
}

impl Buttons {
    pub fn from_bits(bits: u16) -> Self {
        let set = |mask: u16| bits & mask != 0;
        Self {
            d_pad_left: set(0x0001),
            d_pad_right: set(0x0002),
            d_pad_down: set(0x0004),
            d_pad_up: set(0x0008),
            z: set(0x0010),
            r_trigger_digital: set(0x0020),
            l_trigger_digital: set(0x0040),
            a: set(0x0100),
            b: set(0x0200),
            x: set(0x0400),
            y: set(0x0800),
            start: set(0x1000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalInputs {
    #[serde(flatten)]
    pub buttons: Buttons,
    pub r_trigger_analog: f32,
    pub l_trigger_analog: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedInputs {
    #[serde(flatten)]
    pub buttons: Buttons,
    pub joystick_x: f32,
    pub joystick_y: f32,
    pub c_stick_x: f32,
    pub c_stick_y: f32,
    pub any_trigger: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInputs {
    pub frame_number: FrameNumber,
    pub player_index: EntityId,
    pub is_nana: bool,
    pub physical: PhysicalInputs,
    pub processed: ProcessedInputs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub frame_number: FrameNumber,
    pub player_index: EntityId,
    pub is_nana: bool,
    pub internal_character_id: u8,
    pub action_state_id: u16,
    pub x_position: f32,
    pub y_position: f32,
    pub facing_direction: f32,
    pub percent: f32,
    pub shield_size: f32,
    pub last_hitting_attack_id: u8,
    pub current_combo_count: u8,
    pub last_hit_by: u8,
    pub stocks_remaining: u8,
    pub action_state_frame_counter: f32,
    pub hitstun_remaining: f32,
    pub is_grounded: bool,
    pub last_ground_id: u16,
    pub jumps_remaining: u8,
    pub l_cancel_status: u8,
    pub hurtbox_collision_state: u8,
    pub self_induced_air_x_speed: f32,
    pub self_induced_air_y_speed: f32,
    pub attack_based_x_speed: f32,
    pub attack_based_y_speed: f32,
    pub self_induced_ground_x_speed: f32,
    pub hitlag_remaining: f32,
    pub is_in_hitstun: bool,
    pub is_dead: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerFrame {
    pub frame_number: FrameNumber,
    pub player_index: EntityId,
    pub inputs: PlayerInputs,
    pub state: PlayerState,
}

impl PlayerFrame {
    pub fn from_row(row: &PlayerFrameRow, relative: FrameNumber) -> Self {
        let buttons = Buttons::from_bits(row.buttons);
        Self {
            frame_number: relative,
            player_index: row.player_index,
            inputs: PlayerInputs {
                frame_number: relative,
                player_index: row.player_index,
                is_nana: row.follower,
                physical: PhysicalInputs {
                    buttons,
                    r_trigger_analog: row.phys_r,
                    l_trigger_analog: row.phys_l,
                },
                processed: ProcessedInputs {
                    buttons,
                    joystick_x: row.joy_x,
                    joystick_y: row.joy_y,
                    c_stick_x: row.c_x,
                    c_stick_y: row.c_y,
                    any_trigger: row.phys_l.max(row.phys_r),
                },
            },
            state: PlayerState {
                frame_number: relative,
                player_index: row.player_index,
                is_nana: row.follower,
                internal_character_id: row.char_id,
                action_state_id: row.action_state,
                x_position: row.pos_x,
                y_position: row.pos_y,
                facing_direction: row.face_dir,
                percent: row.percent,
                shield_size: row.shield,
                last_hitting_attack_id: row.hit_with,
                current_combo_count: row.combo,
                last_hit_by: row.hurt_by,
                stocks_remaining: row.stocks,
                action_state_frame_counter: row.action_frame,
                hitstun_remaining: row.hitstun,
                is_grounded: !row.airborne,
                last_ground_id: row.ground_id,
                jumps_remaining: row.jumps,
                l_cancel_status: row.l_cancel,
                hurtbox_collision_state: row.hurtbox,
                self_induced_air_x_speed: row.self_air_x,
                self_induced_air_y_speed: row.self_air_y,
                attack_based_x_speed: row.attack_x,
                attack_based_y_speed: row.attack_y,
                self_induced_ground_x_speed: row.self_ground_x,
                hitlag_remaining: row.hitlag,
                is_in_hitstun: row.hitstun > 0.0,
                is_dead: !row.alive,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFrame {
    pub frame_number: FrameNumber,
    pub type_id: u16,
    pub state: u8,
    pub facing_direction: f32,
    pub x_velocity: f32,
    pub y_velocity: f32,
    pub x_position: f32,
    pub y_position: f32,
    pub spawn_id: u32,
    pub samus_missile_type: u8,
    pub peach_turnip_face: u8,
    pub charge_shot_charge_level: u8,
    pub owner: i8,
}

impl ItemFrame {
    pub fn from_row(row: &ItemRow, relative: FrameNumber) -> Self {
        Self {
            frame_number: relative,
            type_id: row.type_id,
            state: row.state,
            facing_direction: row.facing_direction,
            x_velocity: row.x_velocity,
            y_velocity: row.y_velocity,
            x_position: row.x_position,
            y_position: row.y_position,
            spawn_id: row.spawn_id,
            samus_missile_type: row.missile_type,
            peach_turnip_face: row.turnip_face,
            charge_shot_charge_level: row.charge_level,
            owner: row.owner,
        }
    }
}

/// Fountain of Dreams platform heights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageFrame {
    pub frame_number: FrameNumber,
    pub fod_left_platform_height: f32,
    pub fod_right_platform_height: f32,
}

impl StageFrame {
    pub fn from_row(row: &PlatformRow, relative: FrameNumber) -> Self {
        Self {
            frame_number: relative,
            fod_left_platform_height: row.left_height,
            fod_right_platform_height: row.right_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameObject {
    /// 0-based position in the returned frame list.
    pub frame_number: FrameNumber,
    pub random_seed: u32,
    pub players: Vec<PlayerFrame>,
    pub items: Vec<ItemFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageFrame>,
}

/// Two neighbouring relative frames whose absolute numbers are not adjacent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameGap {
    /// Relative number of the frame after the gap.
    pub relative_frame: FrameNumber,
    pub previous_absolute: FrameNumber,
    pub absolute: FrameNumber,
}

impl FrameGap {
    pub fn missing(&self) -> FrameNumber {
        self.absolute - self.previous_absolute - 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySettings {
    pub replay_format_version: String,
    /// Match ids are the recording start timestamp.
    pub start_time_stamp: String,
    pub stage_id: u16,
    pub timer_start: u32,
    pub frame_count: FrameNumber,
    pub player_settings: Vec<PlayerSettings>,
}

impl ReplaySettings {
    pub fn new(settings: MatchSettings, mut players: Vec<PlayerSettings>) -> Self {
        players.sort_by_key(|p| p.player_index);
        Self {
            replay_format_version: settings.replay_format_version,
            start_time_stamp: settings.match_id,
            stage_id: settings.stage_id,
            timer_start: settings.timer_start,
            frame_count: settings.frame_count,
            player_settings: players,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEnding {
    pub game_end_method: Option<u8>,
    pub lras_initiator_index: i8,
    pub placements: Vec<u8>,
}

impl Default for GameEnding {
    fn default() -> Self {
        Self {
            game_end_method: None,
            lras_initiator_index: -1,
            placements: Vec::new(),
        }
    }
}

/// Payload returned by a replay-data fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayData {
    pub settings: ReplaySettings,
    pub frames: Vec<FrameObject>,
    pub ending: GameEnding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gaps: Vec<FrameGap>,
}
