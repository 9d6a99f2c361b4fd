use thiserror::Error;

use super::store::StoreError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("query failed: {0}")]
    Query(#[from] QueryError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("log query failed: {reason}")]
    JobFailed { reason: String },
    #[error("log query {job_id} still running after {polls} polls")]
    JobTimeout { job_id: String, polls: u32 },
    #[error("log query {job_id} returned {got} rows, expected {expected}")]
    UnexpectedRows {
        job_id: String,
        expected: &'static str,
        got: &'static str,
    },
    #[error("log source error: {0}")]
    Source(#[source] anyhow::Error),
    #[error("tag store error: {0}")]
    Tag(#[from] StoreError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
}

impl QueryError {
    /// True when the failure is caused by the caller's input rather than by
    /// the engine or a backend.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::NotFound(_))
    }
}
