//! Auxiliary HTTP surface (spec.md §6): `GET /health`, `POST /api/v1/scrub`,
//! `GET /api/v1/status`, `GET /api/v1/health/metadata`, `POST
//! /api/v1/threshold`. No endpoint accepts a tenant triple from the request
//! body — the checkpoint-read/write endpoints a caller could otherwise use
//! to cross tenants were removed outright rather than patched (§7 security
//! model); the surviving endpoints that need a tenant use the server's
//! configured `default_tenant` only.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Response as HttpResponse, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use contextd_checkpoint::{CheckpointService, SaveCheckpointInput};
use contextd_embeddings::EmbeddingProvider;
use contextd_scrubber::scrub_ingest;
use contextd_statusline::StatuslineService;
use contextd_tenant::TenantInfo;
use contextd_vector_store::VectorStore;
use serde::{Deserialize, Serialize};

use crate::config::ConfigHandle;
use crate::server_security::AuthToken;

pub struct AppState {
    pub store: Arc<VectorStore>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub config: ConfigHandle,
    pub checkpoints: Arc<CheckpointService>,
    pub statusline: Arc<StatuslineService>,
    pub auth: Option<AuthToken>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/scrub", post(scrub))
        .route("/api/v1/status", get(status))
        .route("/api/v1/health/metadata", get(health_metadata))
        .route("/api/v1/threshold", post(threshold))
        .with_state(state)
}

fn is_authorized(headers: &HeaderMap, token: &Option<AuthToken>) -> bool {
    let Some(token) = token else {
        return true;
    };
    let Some(value) = headers.get(AUTHORIZATION) else {
        return false;
    };
    let Ok(value) = value.to_str() else {
        return false;
    };
    token.matches_http_authorization_header(value)
}

fn unauthorized() -> Response {
    HttpResponse::builder()
        .status(StatusCode::UNAUTHORIZED)
        .header("www-authenticate", "Bearer")
        .body(Body::from("unauthorized"))
        .expect("valid HTTP response")
}

fn default_tenant(state: &AppState) -> Result<TenantInfo, Response> {
    let config = state.config.current();
    let default = &config.default_tenant;
    let Some(tenant_id) = default.tenant_id.clone() else {
        return Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "no default_tenant configured; this endpoint cannot authenticate a caller-supplied tenant",
        ));
    };
    let project_id = default.project_id.clone().unwrap_or_else(|| "default".to_string());
    let tenant = TenantInfo::new(tenant_id, project_id).map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))?;
    Ok(match &default.team_id {
        Some(team) => tenant
            .with_team(team.clone())
            .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))?,
        None => tenant,
    })
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "error": message });
    HttpResponse::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid HTTP response")
}

fn json_response(status: StatusCode, value: impl Serialize) -> Response {
    let bytes = serde_json::to_vec(&value).unwrap_or_default();
    HttpResponse::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .expect("valid HTTP response")
}

async fn health() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

#[derive(Deserialize)]
struct ScrubRequest {
    content: String,
}

#[derive(Serialize, Deserialize)]
struct ScrubResponse {
    content: String,
    findings_count: usize,
}

async fn scrub(headers: HeaderMap, State(state): State<Arc<AppState>>, Json(req): Json<ScrubRequest>) -> Response {
    if !is_authorized(&headers, &state.auth) {
        return unauthorized();
    }
    let result = scrub_ingest(&req.content);
    json_response(
        StatusCode::OK,
        ScrubResponse {
            content: result.scrubbed_text,
            findings_count: result.findings_count,
        },
    )
}

async fn status(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    if !is_authorized(&headers, &state.auth) {
        return unauthorized();
    }
    let tenant = match default_tenant(&state) {
        Ok(tenant) => tenant,
        Err(response) => return response,
    };
    let snapshot = state.statusline.snapshot(&tenant).await;
    json_response(StatusCode::OK, snapshot)
}

async fn health_metadata(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    if !is_authorized(&headers, &state.auth) {
        return unauthorized();
    }
    match state.store.health_scan().await {
        Ok(report) => json_response(StatusCode::OK, report),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

#[derive(Deserialize)]
struct ThresholdRequest {
    session_id: Option<String>,
    token_count: u64,
    summary: Option<String>,
    context: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct ThresholdResponse {
    checkpoint_saved: bool,
    checkpoint_id: Option<String>,
}

async fn threshold(headers: HeaderMap, State(state): State<Arc<AppState>>, Json(req): Json<ThresholdRequest>) -> Response {
    if !is_authorized(&headers, &state.auth) {
        return unauthorized();
    }
    let tenant = match default_tenant(&state) {
        Ok(tenant) => tenant,
        Err(response) => return response,
    };
    let config = state.config.current();
    if req.token_count < config.auto_checkpoint.token_threshold {
        return json_response(
            StatusCode::OK,
            ThresholdResponse {
                checkpoint_saved: false,
                checkpoint_id: None,
            },
        );
    }

    let mut input = SaveCheckpointInput::new(tenant, format!("auto-{}", req.token_count));
    input.session_id = req.session_id;
    input.summary = req.summary;
    input.context = req.context;
    input.token_count = req.token_count;
    input.auto_created = true;

    match state.checkpoints.save(input).await {
        Ok(Some(record)) => json_response(
            StatusCode::OK,
            ThresholdResponse {
                checkpoint_saved: true,
                checkpoint_id: Some(record.id),
            },
        ),
        Ok(None) => json_response(
            StatusCode::OK,
            ThresholdResponse {
                checkpoint_saved: false,
                checkpoint_id: None,
            },
        ),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::to_bytes;
    use contextd_embeddings::StubProvider;
    use tempfile::tempdir;
    use tower::ServiceExt;

    async fn test_state(default_tenant: Option<&str>) -> Arc<AppState> {
        let dir = tempdir().unwrap();
        let store = Arc::new(VectorStore::open(dir.path()).await.unwrap());
        let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(StubProvider::new(8));
        let mut config = Config::default();
        config.default_tenant.tenant_id = default_tenant.map(str::to_string);
        config.default_tenant.project_id = Some("proj".to_string());
        Arc::new(AppState {
            checkpoints: Arc::new(CheckpointService::new(store.clone(), embeddings.clone())),
            statusline: Arc::new(StatuslineService::new(store.clone(), 8)),
            store,
            embeddings,
            config: ConfigHandle::new(config),
            auth: None,
        })
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let state = test_state(None).await;
        let app = router(state);
        let response = app
            .oneshot(axum::http::Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn scrub_redacts_known_secret_shapes() {
        let state = test_state(None).await;
        let app = router(state);
        let body = serde_json::json!({ "content": "OPENAI_API_KEY=sk-abcdefghijklmnopqrstuvwxyz0123" });
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/api/v1/scrub")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: ScrubResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(parsed.content.contains("[REDACTED]"));
        assert!(!parsed.content.contains("sk-abcdefghij"));
    }

    #[tokio::test]
    async fn status_without_default_tenant_is_unavailable() {
        let state = test_state(None).await;
        let app = router(state);
        let response = app
            .oneshot(axum::http::Request::builder().uri("/api/v1/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn threshold_below_token_count_does_not_checkpoint() {
        let state = test_state(Some("acme")).await;
        let app = router(state);
        let body = serde_json::json!({ "session_id": null, "token_count": 1, "summary": null, "context": null });
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/api/v1/threshold")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: ThresholdResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!parsed.checkpoint_saved);
    }
}
