use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

const MAX_TENANT_LEN: usize = 64;

/// Identity boundary for every log read, cache key and tag key.
///
/// Tenant ids end up inside storage paths, so only ASCII alphanumerics,
/// `_` and `-` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QueryError::InvalidRequest(
                "tenant id cannot be empty".to_string(),
            ));
        }
        if trimmed.len() > MAX_TENANT_LEN {
            return Err(QueryError::InvalidRequest(format!(
                "tenant id too long ({} chars, max {MAX_TENANT_LEN})",
                trimmed.len()
            )));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(QueryError::InvalidRequest(
                "tenant id may only contain letters, digits, '_' and '-'".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TenantId {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TenantId> for String {
    fn from(value: TenantId) -> Self {
        value.0
    }
}
