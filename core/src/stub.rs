//! Result rows returned by stub queries.

use serde::{Deserialize, Serialize};

use crate::source::{EntityId, FrameNumber, PlayerSettings, PunishRow};

/// One player of the clipped match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMeta {
    pub player_index: EntityId,
    pub character_id: u16,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub connect_code: String,
}

impl From<&PlayerSettings> for EntityMeta {
    fn from(p: &PlayerSettings) -> Self {
        Self {
            player_index: p.player_index,
            character_id: p.character_id,
            tag: p.tag.clone(),
            connect_code: p.connect_code.clone(),
        }
    }
}

/// A buffered window of one match, in match frame coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub match_id: String,
    pub frame_start: FrameNumber,
    pub frame_end: FrameNumber,
    pub stage_id: u16,
    pub players: Vec<EntityMeta>,
}

impl Clip {
    pub fn same_window(
        &self,
        match_id: &str,
        frame_start: FrameNumber,
        frame_end: FrameNumber,
    ) -> bool {
        self.match_id == match_id && self.frame_start == frame_start && self.frame_end == frame_end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboStats {
    pub num_moves: u32,
    pub start_pct: f64,
    pub end_pct: f64,
    pub damage_dealt: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stocks: Option<u8>,
}

impl From<&PunishRow> for ComboStats {
    fn from(row: &PunishRow) -> Self {
        Self {
            num_moves: row.num_moves,
            start_pct: row.start_pct,
            end_pct: row.end_pct,
            damage_dealt: row.damage(),
            stocks: row.stocks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStub {
    #[serde(flatten)]
    pub clip: Clip,
    #[serde(default)]
    pub bugged: bool,
    #[serde(flatten)]
    pub combo: Option<ComboStats>,
}

impl ReplayStub {
    pub fn new(clip: Clip) -> Self {
        Self {
            clip,
            bugged: false,
            combo: None,
        }
    }

    pub fn with_combo(mut self, stats: ComboStats) -> Self {
        self.combo = Some(stats);
        self
    }

    pub fn match_id(&self) -> &str {
        &self.clip.match_id
    }
}

/// Stable ordering with bugged stubs moved to the end.
pub fn bugged_last(stubs: &mut [ReplayStub]) {
    stubs.sort_by_key(|s| s.bugged);
}

/// Client-side narrowing of a stub list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StubFilter {
    /// Allowed stage ids; empty allows every stage.
    #[serde(default)]
    pub stages: Vec<u16>,
    /// Every name must match some player's connect code or tag, ignoring
    /// case.
    #[serde(default)]
    pub names: Vec<String>,
}

impl StubFilter {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty() && self.names.is_empty()
    }

    pub fn matches(&self, stub: &ReplayStub) -> bool {
        let stage_ok = self.stages.is_empty() || self.stages.contains(&stub.clip.stage_id);
        stage_ok
            && self.names.iter().all(|name| {
                stub.clip.players.iter().any(|p| {
                    p.connect_code.eq_ignore_ascii_case(name) || p.tag.eq_ignore_ascii_case(name)
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stub(match_id: &str, stage: u16, bugged: bool) -> ReplayStub {
        ReplayStub {
            clip: Clip {
                match_id: match_id.into(),
                frame_start: 0,
                frame_end: 100,
                stage_id: stage,
                players: vec![EntityMeta {
                    player_index: 0,
                    character_id: 2,
                    tag: "Mango".into(),
                    connect_code: "MANG#0".into(),
                }],
            },
            bugged,
            combo: None,
        }
    }

    #[test]
    fn sequence_stubs_omit_combo_fields() {
        let json = serde_json::to_value(stub("m1", 31, false)).unwrap();
        assert_eq!(json["matchId"], "m1");
        assert_eq!(json["stageId"], 31);
        assert!(json.get("numMoves").is_none());
        assert_eq!(json["players"][0]["connectCode"], "MANG#0");
    }

    #[test]
    fn combo_stubs_round_trip_flattened() {
        let row = PunishRow {
            match_id: "m1".into(),
            entity_id: 1,
            start_frame: 10,
            end_frame: 90,
            num_moves: 6,
            start_pct: 12.0,
            end_pct: 60.0,
            stocks: Some(3),
        };
        let original = stub("m1", 31, true).with_combo(ComboStats::from(&row));
        let json = serde_json::to_value(&original).unwrap();
        assert_eq!(json["damageDealt"], 48.0);
        let back: ReplayStub = serde_json::from_value(json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn bugged_stubs_sort_last_and_keep_order() {
        let mut stubs = vec![
            stub("a", 1, true),
            stub("b", 1, false),
            stub("c", 1, true),
            stub("d", 1, false),
        ];
        bugged_last(&mut stubs);
        let ids: Vec<_> = stubs.iter().map(|s| s.match_id()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn filter_by_stage_and_name() {
        let s = stub("m1", 31, false);
        assert!(StubFilter::default().matches(&s));
        let by_stage = StubFilter { stages: vec![2, 31], names: vec![] };
        assert!(by_stage.matches(&s));
        let by_name = StubFilter { stages: vec![], names: vec!["mang#0".into()] };
        assert!(by_name.matches(&s));
        let miss = StubFilter { stages: vec![31], names: vec!["mango".into(), "zain".into()] };
        assert!(!miss.matches(&s));
    }
}
