//! Ready-made queries offered as browsing categories.

use serde::{Deserialize, Serialize};

use crate::combo::ComboMode;
use crate::sequence::SequenceStep;
use crate::service::QueryRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    LedgeDashes,
    ShineGrabs,
    CombosLength,
    CombosDamage,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::LedgeDashes,
        Category::ShineGrabs,
        Category::CombosLength,
        Category::CombosDamage,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Category::LedgeDashes => "ledge-dashes",
            Category::ShineGrabs => "shine-grabs",
            Category::CombosLength => "combos-length",
            Category::CombosDamage => "combos-damage",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::LedgeDashes => "Ledge Dashes",
            Category::ShineGrabs => "Shine Grabs",
            Category::CombosLength => "Combos (Length)",
            Category::CombosDamage => "Combos (Percent)",
        }
    }

    /// Request for this category. `buffer_frames` only applies to sequence
    /// categories.
    pub fn request(&self, buffer_frames: u32, match_id: Option<String>) -> QueryRequest {
        match self {
            Category::LedgeDashes => QueryRequest::Sequence {
                actions: vec![
                    SequenceStep::new("CLIFF_WAIT").min(7),
                    SequenceStep::new("FALL").min(1).max(3),
                    SequenceStep::new("JUMP").min(1).max(5),
                    SequenceStep::new("AIR_DODGE"),
                ],
                buffer_frames: Some(buffer_frames),
                match_id,
            },
            Category::ShineGrabs => QueryRequest::Sequence {
                actions: vec![
                    SequenceStep::new("SHINE_START").min(1).max(5),
                    SequenceStep::new("SHINE_WAIT").min(1).max(5),
                    SequenceStep::new("JUMP_SQUAT").min(1).max(8),
                    SequenceStep::new("GRAB"),
                ],
                buffer_frames: Some(buffer_frames),
                match_id,
            },
            Category::CombosLength => QueryRequest::Combo {
                combo_type: ComboMode::Length,
                match_id,
            },
            Category::CombosDamage => QueryRequest::Combo {
                combo_type: ComboMode::Damage,
                match_id,
            },
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.slug() == s.trim())
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}
