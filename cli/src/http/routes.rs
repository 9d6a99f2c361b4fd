use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use clipseek_core::api::{QueryRequest, ReplayRequest, TagUpdate, TagUpdateResponse};

use crate::http::{
    models::*,
    state::AppState,
    validation::{json_rejection, tenant_from_headers},
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/stubs", post(stubs_handler))
        .route("/api/v1/replay", post(replay_handler))
        .route("/api/v1/tags", post(tags_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

fn json_bytes(payload: Vec<u8>, extra: Option<(HeaderName, HeaderValue)>) -> Response {
    let mut response = (
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        payload,
    )
        .into_response();
    if let Some((name, value)) = extra {
        response.headers_mut().insert(name, value);
    }
    response
}

/// Count the request and its failure, if any.
fn track<T>(
    state: &AppState,
    endpoint: &str,
    result: Result<T, HttpServerError>,
) -> Result<T, HttpServerError> {
    state.record_request(endpoint);
    if result.is_err() {
        state.record_error();
    }
    result
}

/// POST /api/v1/stubs - sequence or combo query, served from cache when possible
async fn stubs_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Response, HttpServerError> {
    let result = async {
        let tenant = tenant_from_headers(&headers, &state.default_tenant)?;
        let Json(request) = body.map_err(json_rejection)?;
        let (payload, status) = state.service.query_payload(&tenant, request).await?;
        Ok::<_, HttpServerError>(json_bytes(
            payload,
            Some((
                HeaderName::from_static(CACHE_STATUS_HEADER),
                HeaderValue::from_static(status.as_str()),
            )),
        ))
    }
    .await;
    track(&state, "/api/v1/stubs", result)
}

/// POST /api/v1/replay - frame data for a clip window or the whole match
async fn replay_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ReplayRequest>, JsonRejection>,
) -> Result<Response, HttpServerError> {
    let result = async {
        let tenant = tenant_from_headers(&headers, &state.default_tenant)?;
        let Json(request) = body.map_err(json_rejection)?;
        let payload = state.service.replay_payload(&tenant, request).await?;
        Ok::<_, HttpServerError>(json_bytes(payload, None))
    }
    .await;
    track(&state, "/api/v1/replay", result)
}

/// POST /api/v1/tags - set the `bugged` tag of a clip
async fn tags_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<TagUpdate>, JsonRejection>,
) -> Result<Json<TagUpdateResponse>, HttpServerError> {
    let result = async {
        let tenant = tenant_from_headers(&headers, &state.default_tenant)?;
        let Json(update) = body.map_err(json_rejection)?;
        Ok::<_, HttpServerError>(Json(state.service.set_bugged(&tenant, update).await?))
    }
    .await;
    track(&state, "/api/v1/tags", result)
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let (uptime_seconds, requests_handled, errors_total) = match state.stats.read() {
        Ok(stats) => (stats.uptime_seconds(), stats.requests_total, stats.errors_total),
        Err(_) => (0.0, 0, 0),
    };

    Json(HealthResponse {
        status: "healthy".into(),
        uptime_seconds,
        requests_handled,
        errors_total,
        background_refreshes: state.service.background().in_flight(),
        timestamp: Local::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use clipseek_core::api::{
        AppConfig, CacheProvider, MemoryCacheConfig, QueryService, ServicesFactory, TagsProvider,
        TenantId,
    };
    use clipseek_plugins::services::PluginServicesFactory;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// One recorded match for tenant `acme` with a single 5-hit punish at
    /// match frames 1000..1100.
    fn write_dataset(root: &std::path::Path) {
        let tenant_dir = root.join("acme");
        std::fs::create_dir_all(&tenant_dir).unwrap();
        let log = json!({
            "settings": {"matchId": "m1", "stageId": 31, "frameCount": 9000},
            "players": [
                {"matchId": "m1", "playerIndex": 0, "characterId": 2, "tag": "Mango"},
                {"matchId": "m1", "playerIndex": 1, "characterId": 20, "tag": "Zain"}
            ],
            "punishes": [
                {"matchId": "m1", "entityId": 1, "startFrame": 1000, "endFrame": 1100,
                 "numMoves": 5, "startPct": 10.0, "endPct": 60.0}
            ]
        });
        std::fs::write(tenant_dir.join("m1.json"), log.to_string()).unwrap();
    }

    async fn test_state(root: &std::path::Path) -> AppState {
        let mut cfg = AppConfig::default();
        cfg.tenant = "acme".into();
        cfg.source.data_dir = root.to_string_lossy().to_string();
        cfg.cache.provider = CacheProvider::Memory(MemoryCacheConfig { capacity: 16 });
        cfg.tags.provider = TagsProvider::Memory;
        cfg.query.poll_interval_ms = 1;

        let services = PluginServicesFactory.build_services(&cfg).await.unwrap();
        let service = QueryService::new(services, &cfg);
        AppState::new(service, TenantId::parse("acme").unwrap(), cfg)
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn combo_query_reports_cache_status() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let state = test_state(dir.path()).await;
        let app = create_router(state.clone());
        let request = json!({"queryType": "combo", "comboType": "length"});

        let first = app.clone().oneshot(post("/api/v1/stubs", request.clone())).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()[CACHE_STATUS_HEADER], "miss");
        let stubs = body_json(first).await;
        assert_eq!(stubs[0]["matchId"], "m1");
        assert_eq!(stubs[0]["frameStart"], 940);
        assert_eq!(stubs[0]["frameEnd"], 1130);
        assert_eq!(stubs[0]["numMoves"], 5);
        assert_eq!(stubs[0]["bugged"], false);

        let second = app.oneshot(post("/api/v1/stubs", request)).await.unwrap();
        assert_eq!(second.headers()[CACHE_STATUS_HEADER], "hit");
        state.service.background().wait_idle().await;
    }

    #[tokio::test]
    async fn bad_bodies_are_client_errors() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir.path()).await);

        let response = app
            .clone()
            .oneshot(post("/api/v1/stubs", json!({"queryType": "sequence"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error_code"], "INVALID_REQUEST");

        let response = app
            .clone()
            .oneshot(post("/api/v1/replay", json!({"frameStart": 0, "frameEnd": 10})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post("/api/v1/tags", json!({"matchId": "m1", "frameStart": 0})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_match_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let app = create_router(test_state(dir.path()).await);

        let response = app
            .oneshot(post(
                "/api/v1/replay",
                json!({"matchId": "nope", "frameStart": 0, "frameEnd": 10}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn tenant_header_scopes_data() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let app = create_router(test_state(dir.path()).await);

        let mut request = post(
            "/api/v1/stubs",
            json!({"queryType": "combo", "comboType": "length"}),
        );
        request
            .headers_mut()
            .insert(TENANT_HEADER, HeaderValue::from_static("other"));
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));

        let mut request =
            post("/api/v1/stubs", json!({"queryType": "combo", "comboType": "length"}));
        request
            .headers_mut()
            .insert(TENANT_HEADER, HeaderValue::from_static("bad tenant"));
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn tag_update_and_health() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(post(
                "/api/v1/tags",
                json!({"matchId": "m1", "frameStart": 0, "frameEnd": 120, "bugged": true}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"bugged": true}));

        let health = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(health).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["requests_handled"], 1);
        assert_eq!(body["errors_total"], 0);
    }
}
