use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::source::FrameNumber;
use crate::tenant::TenantId;

/// Slash-separated object key. Always tenant-scoped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// `stubs/{kind}/{tenant}/{paramHash}-{matchId|all}.json`
    ///
    /// `params` must already be normalised; its JSON encoding is what gets
    /// hashed.
    pub fn stubs<P: Serialize>(
        kind: &str,
        tenant: &TenantId,
        params: &P,
        match_id: Option<&str>,
    ) -> Result<Self, serde_json::Error> {
        let hash = param_hash(params)?;
        let scope = match_id.map(sanitize_segment).unwrap_or_else(|| "all".to_string());
        Ok(Self(format!(
            "stubs/{}/{}/{}-{}.json",
            sanitize_segment(kind),
            tenant,
            hash,
            scope
        )))
    }

    /// `replays/{tenant}/{matchId}-{frameStart}-{frameEnd}.json`, or
    /// `replays/{tenant}/{matchId}-full.json` without a range.
    pub fn replay(
        tenant: &TenantId,
        match_id: &str,
        range: Option<(FrameNumber, FrameNumber)>,
    ) -> Self {
        let match_id = sanitize_segment(match_id);
        match range {
            Some((start, end)) => Self(format!("replays/{tenant}/{match_id}-{start}-{end}.json")),
            None => Self(format!("replays/{tenant}/{match_id}-full.json")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments, safe to join onto a directory.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hex SHA-256 of the JSON encoding of `params`.
pub fn param_hash<P: Serialize>(params: &P) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(params)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

fn sanitize_segment(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() || out.starts_with('.') {
        out.insert(0, '_');
    }
    out
}
