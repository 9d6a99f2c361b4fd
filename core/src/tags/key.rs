use serde::{Deserialize, Serialize};

use crate::source::FrameNumber;
use crate::tenant::TenantId;

pub const BUGGED_TAG: &str = "bugged";

/// Identifies the tags of one stub.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagKey {
    pub tenant: TenantId,
    pub match_id: String,
    pub frame_start: FrameNumber,
    pub frame_end: FrameNumber,
}

impl TagKey {
    pub fn new(
        tenant: TenantId,
        match_id: &str,
        frame_start: FrameNumber,
        frame_end: FrameNumber,
    ) -> Self {
        Self {
            tenant,
            match_id: match_id.to_string(),
            frame_start,
            frame_end,
        }
    }

    /// `replay#{matchId}`
    pub fn partition(&self) -> String {
        format!("replay#{}", self.match_id)
    }

    /// `stub#{frameStart}#{frameEnd}`
    pub fn sort(&self) -> String {
        format!("stub#{}#{}", self.frame_start, self.frame_end)
    }

    /// Flat key used by simple stores: tenant, partition and sort joined.
    pub fn storage_key(&self) -> String {
        format!("{}/{}/{}", self.tenant, self.partition(), self.sort())
    }
}

/// `tag_{name}` with anything outside `[A-Za-z0-9_]` replaced by `_`.
pub fn tag_attribute(tag: &str) -> String {
    let cleaned: String = tag
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("tag_{cleaned}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout() {
        let key = TagKey::new(TenantId::parse("acme").unwrap(), "m1", 260, 633);
        assert_eq!(key.partition(), "replay#m1");
        assert_eq!(key.sort(), "stub#260#633");
        assert_eq!(key.storage_key(), "acme/replay#m1/stub#260#633");
    }

    #[test]
    fn attribute_names_are_sanitised() {
        assert_eq!(tag_attribute(BUGGED_TAG), "tag_bugged");
        assert_eq!(tag_attribute("needs review!"), "tag_needs_review_");
    }
}
