use thiserror::Error;

/// Errors returned by result-cache and tag-store backends.
///
/// A missing key is not an error: `get`-style calls return `Ok(None)`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store io error on {key}: {source}")]
    Io {
        key: String,
        source: std::io::Error,
    },
    #[error("store payload for {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },
    #[error("store backend error: {0}")]
    Backend(String),
}
