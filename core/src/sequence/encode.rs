//! Run-length encoding of per-entity state logs.

use std::collections::BTreeMap;

use super::types::Run;
use crate::source::{EntityId, FrameRecord, StateTable};

/// All frames of one entity in one match, ordered by frame number.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityLog {
    pub match_id: String,
    pub entity_id: EntityId,
    pub frames: Vec<FrameRecord>,
}

/// Split a mixed log into per-(match, entity) logs in a stable order.
pub fn group_entity_logs(frames: Vec<FrameRecord>) -> Vec<EntityLog> {
    let mut grouped: BTreeMap<(String, EntityId), Vec<FrameRecord>> = BTreeMap::new();
    for frame in frames {
        grouped
            .entry((frame.match_id.clone(), frame.entity_id))
            .or_default()
            .push(frame);
    }
    grouped
        .into_iter()
        .map(|((match_id, entity_id), mut frames)| {
            frames.sort_by_key(|f| f.frame_number);
            EntityLog {
                match_id,
                entity_id,
                frames,
            }
        })
        .collect()
}

/// Collapse an ordered entity log into maximal runs of one state name.
pub fn encode_runs(log: &EntityLog, states: &StateTable) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for frame in &log.frames {
        let name = states.name_of(frame.state_id);
        match runs.last_mut() {
            Some(run) if run.state_name == name => {
                run.end_frame = frame.frame_number;
                run.frame_count = frame_count(run.start_frame, run.end_frame);
            }
            _ => runs.push(Run {
                match_id: log.match_id.clone(),
                entity_id: log.entity_id,
                state_name: name.into_owned(),
                start_frame: frame.frame_number,
                end_frame: frame.frame_number,
                frame_count: 1,
            }),
        }
    }
    runs
}

fn frame_count(start: i64, end: i64) -> u32 {
    u32::try_from(end - start + 1).unwrap_or(u32::MAX)
}
