use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::source::{EntityId, FrameNumber};

/// One template step: a state name plus optional duration bounds in frames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceStep {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_frames: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_frames: Option<u32>,
}

impl SequenceStep {
    pub fn new(action: &str) -> Self {
        Self {
            action: action.to_string(),
            min_frames: None,
            max_frames: None,
        }
    }

    pub fn min(mut self, frames: u32) -> Self {
        self.min_frames = Some(frames);
        self
    }

    pub fn max(mut self, frames: u32) -> Self {
        self.max_frames = Some(frames);
        self
    }

    pub fn accepts(&self, run: &Run) -> bool {
        run.state_name == self.action
            && self.min_frames.map_or(true, |min| run.frame_count >= min)
            && self.max_frames.map_or(true, |max| run.frame_count <= max)
    }
}

/// Validated, normalised template. State names are trimmed and upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SequenceSpec {
    steps: Vec<SequenceStep>,
}

impl SequenceSpec {
    pub fn new(steps: Vec<SequenceStep>) -> Result<Self, QueryError> {
        if steps.is_empty() {
            return Err(QueryError::InvalidRequest(
                "sequence needs at least one action".to_string(),
            ));
        }
        let mut normalised = Vec::with_capacity(steps.len());
        for (i, step) in steps.into_iter().enumerate() {
            let action = step.action.trim().to_ascii_uppercase();
            if action.is_empty() {
                return Err(QueryError::InvalidRequest(format!(
                    "action {i} has an empty state name"
                )));
            }
            if let (Some(min), Some(max)) = (step.min_frames, step.max_frames) {
                if min > max {
                    return Err(QueryError::InvalidRequest(format!(
                        "action {i} ({action}) has minFrames {min} > maxFrames {max}"
                    )));
                }
            }
            normalised.push(SequenceStep {
                action,
                min_frames: step.min_frames,
                max_frames: step.max_frames,
            });
        }
        Ok(Self { steps: normalised })
    }

    pub fn steps(&self) -> &[SequenceStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Distinct state names used anywhere in the template.
    pub fn vocabulary(&self) -> BTreeSet<&str> {
        self.steps.iter().map(|s| s.action.as_str()).collect()
    }
}

/// A maximal span of frames where one entity's state name does not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub match_id: String,
    pub entity_id: EntityId,
    pub state_name: String,
    pub start_frame: FrameNumber,
    pub end_frame: FrameNumber,
    pub frame_count: u32,
}

/// Runs matching a template, one per step, taken consecutively from one
/// entity's run list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
    pub match_id: String,
    pub entity_id: EntityId,
    pub sequence_start: FrameNumber,
    pub sequence_end: FrameNumber,
    pub runs: Vec<Run>,
}
