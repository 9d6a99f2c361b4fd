use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use super::frame::{FrameGap, FrameObject, ItemFrame, PlayerFrame, StageFrame, TRACKED_ITEM_TYPES};
use crate::source::{FrameNumber, ItemRow, PlatformRow, PlayerFrameRow};

/// Frames rebuilt from log rows, plus what went wrong along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub frames: Vec<FrameObject>,
    pub gaps: Vec<FrameGap>,
    /// Set when the frame cap was reached.
    pub truncated: bool,
}

/// Group per-player rows into frame objects.
///
/// Frames are ordered by absolute frame number and renumbered from 0. Items
/// and platform rows are attached by absolute frame number. Non-adjacent
/// absolute numbers are reported as gaps; they never fail the assembly.
pub fn assemble_frames(
    players: Vec<PlayerFrameRow>,
    items: Vec<ItemRow>,
    platforms: Vec<PlatformRow>,
    frame_cap: Option<usize>,
) -> Assembled {
    let mut by_frame: BTreeMap<FrameNumber, Vec<PlayerFrameRow>> = BTreeMap::new();
    for row in players {
        by_frame.entry(row.frame_number).or_default().push(row);
    }

    let truncated = frame_cap.is_some_and(|cap| by_frame.len() >= cap);
    let cap = frame_cap.unwrap_or(usize::MAX);

    let mut items_by_frame: HashMap<FrameNumber, Vec<ItemRow>> = HashMap::new();
    for item in items {
        if TRACKED_ITEM_TYPES.contains(&item.type_id) {
            items_by_frame.entry(item.frame_number).or_default().push(item);
        }
    }
    let mut platform_by_frame: HashMap<FrameNumber, PlatformRow> = HashMap::new();
    for platform in platforms {
        platform_by_frame.entry(platform.frame_number).or_insert(platform);
    }

    let mut frames = Vec::with_capacity(by_frame.len().min(cap));
    let mut gaps = Vec::new();
    let mut previous: Option<FrameNumber> = None;

    for (index, (absolute, mut rows)) in by_frame.into_iter().take(cap).enumerate() {
        let relative = index as FrameNumber;
        if let Some(previous) = previous {
            if absolute != previous + 1 {
                let gap = FrameGap {
                    relative_frame: relative,
                    previous_absolute: previous,
                    absolute,
                };
                warn!(
                    target: "clipseek.assemble",
                    relative_frame = relative,
                    previous_absolute = previous,
                    absolute,
                    missing = gap.missing(),
                    "gap in frame log"
                );
                gaps.push(gap);
            }
        }
        previous = Some(absolute);

        rows.sort_by_key(|r| (r.player_index, r.follower));
        let random_seed = rows.first().map(|r| r.seed).unwrap_or_default();
        let players = rows.iter().map(|r| PlayerFrame::from_row(r, relative)).collect();
        let items = items_by_frame
            .remove(&absolute)
            .unwrap_or_default()
            .iter()
            .map(|r| ItemFrame::from_row(r, relative))
            .collect();
        let stage = platform_by_frame
            .get(&absolute)
            .map(|r| StageFrame::from_row(r, relative));

        frames.push(FrameObject {
            frame_number: relative,
            random_seed,
            players,
            items,
            stage,
        });
    }

    debug!(
        target: "clipseek.assemble",
        frames = frames.len(),
        gaps = gaps.len(),
        truncated,
        "assembled frames"
    );

    Assembled {
        frames,
        gaps,
        truncated,
    }
}
