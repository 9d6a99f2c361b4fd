//! Top-K ranking of punish intervals.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ComboConfig;
use crate::source::PunishRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComboMode {
    /// Most moves first.
    Length,
    /// Most percent dealt first, above the configured threshold.
    Damage,
}

impl ComboMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComboMode::Length => "length",
            ComboMode::Damage => "damage",
        }
    }
}

impl std::str::FromStr for ComboMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "length" => Ok(ComboMode::Length),
            "damage" | "percent" => Ok(ComboMode::Damage),
            other => Err(format!("unknown combo type '{other}'")),
        }
    }
}

/// Keep the best `top_k` punishes of every match.
///
/// Output is ordered by match id, then by rank within the match. Ties are
/// broken by the earlier start frame.
pub fn rank_combos(rows: Vec<PunishRow>, mode: ComboMode, config: &ComboConfig) -> Vec<PunishRow> {
    let mut by_match: BTreeMap<String, Vec<PunishRow>> = BTreeMap::new();
    for row in rows {
        if mode == ComboMode::Damage
            && row.damage().partial_cmp(&config.damage_threshold) != Some(Ordering::Greater)
        {
            continue;
        }
        by_match.entry(row.match_id.clone()).or_default().push(row);
    }

    let mut ranked = Vec::new();
    for (_, mut rows) in by_match {
        rows.sort_by(|a, b| compare(mode, a, b));
        rows.truncate(config.top_k);
        ranked.extend(rows);
    }
    ranked
}

fn compare(mode: ComboMode, a: &PunishRow, b: &PunishRow) -> Ordering {
    let primary = match mode {
        ComboMode::Length => b.num_moves.cmp(&a.num_moves),
        ComboMode::Damage => b.damage().total_cmp(&a.damage()),
    };
    primary.then_with(|| a.start_frame.cmp(&b.start_frame))
}
