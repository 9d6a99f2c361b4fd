use serde::{Deserialize, Serialize};

use crate::combo::ComboMode;
use crate::config::QueryConfig;
use crate::error::QueryError;
use crate::sequence::{SequenceSpec, SequenceStep};
use crate::source::FrameNumber;

/// Stub query as accepted on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "queryType", rename_all = "lowercase")]
pub enum QueryRequest {
    #[serde(rename_all = "camelCase")]
    Sequence {
        actions: Vec<SequenceStep>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        buffer_frames: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        match_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Combo {
        combo_type: ComboMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        match_id: Option<String>,
    },
}

impl QueryRequest {
    /// Validate and normalise into the form that is executed and hashed.
    pub fn plan(self, defaults: &QueryConfig) -> Result<QueryPlan, QueryError> {
        match self {
            QueryRequest::Sequence {
                actions,
                buffer_frames,
                match_id,
            } => Ok(QueryPlan::Sequence {
                spec: SequenceSpec::new(actions)?,
                buffer_frames: buffer_frames.unwrap_or(defaults.buffer_frames),
                match_id: normalise_match_id(match_id),
            }),
            QueryRequest::Combo {
                combo_type,
                match_id,
            } => Ok(QueryPlan::Combo {
                mode: combo_type,
                match_id: normalise_match_id(match_id),
            }),
        }
    }
}

fn normalise_match_id(match_id: Option<String>) -> Option<String> {
    match_id
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

/// Normalised stub query. Its JSON encoding is the cache fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QueryPlan {
    Sequence {
        spec: SequenceSpec,
        buffer_frames: u32,
        match_id: Option<String>,
    },
    Combo {
        mode: ComboMode,
        match_id: Option<String>,
    },
}

impl QueryPlan {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryPlan::Sequence { .. } => "sequence",
            QueryPlan::Combo { .. } => "combo",
        }
    }

    pub fn match_id(&self) -> Option<&str> {
        match self {
            QueryPlan::Sequence { match_id, .. } | QueryPlan::Combo { match_id, .. } => {
                match_id.as_deref()
            }
        }
    }
}

/// Replay-data fetch. Without both bounds the whole match is returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRequest {
    #[serde(default)]
    pub match_id: Option<String>,
    #[serde(default)]
    pub frame_start: Option<FrameNumber>,
    #[serde(default)]
    pub frame_end: Option<FrameNumber>,
}

impl ReplayRequest {
    pub fn new(match_id: &str, range: Option<(FrameNumber, FrameNumber)>) -> Self {
        Self {
            match_id: Some(match_id.to_string()),
            frame_start: range.map(|r| r.0),
            frame_end: range.map(|r| r.1),
        }
    }

    /// Match id and optional range in match frame coordinates.
    pub fn validate(&self) -> Result<(String, Option<(FrameNumber, FrameNumber)>), QueryError> {
        let match_id = normalise_match_id(self.match_id.clone())
            .ok_or_else(|| QueryError::InvalidRequest("missing matchId".to_string()))?;
        let range = match (self.frame_start, self.frame_end) {
            (Some(start), Some(end)) => {
                if start < 0 || end < start {
                    return Err(QueryError::InvalidRequest(format!(
                        "invalid frame range {start}..{end}"
                    )));
                }
                Some((start, end))
            }
            _ => None,
        };
        Ok((match_id, range))
    }
}

/// Tag update. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagUpdate {
    #[serde(default)]
    pub match_id: Option<String>,
    #[serde(default)]
    pub frame_start: Option<FrameNumber>,
    #[serde(default)]
    pub frame_end: Option<FrameNumber>,
    #[serde(default)]
    pub bugged: Option<bool>,
}

impl TagUpdate {
    pub fn new(
        match_id: &str,
        frame_start: FrameNumber,
        frame_end: FrameNumber,
        bugged: bool,
    ) -> Self {
        Self {
            match_id: Some(match_id.to_string()),
            frame_start: Some(frame_start),
            frame_end: Some(frame_end),
            bugged: Some(bugged),
        }
    }

    pub fn validate(&self) -> Result<(String, FrameNumber, FrameNumber, bool), QueryError> {
        let match_id = normalise_match_id(self.match_id.clone());
        match (match_id, self.frame_start, self.frame_end, self.bugged) {
            (Some(m), Some(s), Some(e), Some(b)) => Ok((m, s, e, b)),
            _ => Err(QueryError::InvalidRequest(
                "missing required parameter: { matchId, frameStart, frameEnd, bugged }".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUpdateResponse {
    pub bugged: bool,
}
