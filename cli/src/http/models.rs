use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use clipseek_core::api::QueryError;
use serde::Serialize;

/// Response header telling whether stubs came from the result cache.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// Tenant identity forwarded by the upstream auth layer.
pub const TENANT_HEADER: &str = "x-tenant-id";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub errors_total: u64,
    pub background_refreshes: usize,
    pub timestamp: String,
}

#[derive(Debug)]
pub enum HttpServerError {
    InvalidRequest(String),
    NotFound(String),
    /// The log engine failed or gave up on a job.
    Upstream(String),
    Internal(String),
}

impl From<QueryError> for HttpServerError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidRequest(msg) => Self::InvalidRequest(msg),
            QueryError::NotFound(msg) => Self::NotFound(msg),
            e @ (QueryError::JobFailed { .. }
            | QueryError::JobTimeout { .. }
            | QueryError::Source(_)) => Self::Upstream(e.to_string()),
            e => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            Self::Upstream(msg) => (StatusCode::BAD_GATEWAY, "QUERY_FAILED", msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = serde_json::json!({
            "success": false,
            "error": message,
            "error_code": error_code,
        });

        (status, Json(body)).into_response()
    }
}
