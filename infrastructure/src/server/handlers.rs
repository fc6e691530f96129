//! HTTP route handlers
//!
//! Thin translations between HTTP and the application layer: extract,
//! delegate, map to a status + JSON body. No protocol logic lives here.

use crate::server::AppState;
use crate::server::payloads::{HealthResponse, PromptRequestBody, PromptResponse};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use council_application::{ExtensionGateway, SessionStore, SessionStoreError};
use council_domain::RequestId;
use tracing::warn;

/// GET /health - Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        extension_connected: state.bridge.is_connected(),
        uptime_ms: state.started_at.elapsed().as_millis() as u64,
    })
}

/// POST /prompt - Submit one question to the council
pub async fn prompt_handler(
    State(state): State<AppState>,
    Json(body): Json<PromptRequestBody>,
) -> Response {
    match state.submit.execute(body.into_input()).await {
        Ok(reply) => Json(PromptResponse::from_reply(reply)).into_response(),
        Err(error) => {
            let (status, body) = PromptResponse::failure(&error);
            (status, Json(body)).into_response()
        }
    }
}

/// GET /sessions - List persisted deliberations, most recent first
pub async fn list_sessions_handler(State(state): State<AppState>) -> Response {
    match state.sessions.list().await {
        Ok(summaries) => Json(summaries).into_response(),
        Err(error) => storage_error(error),
    }
}

/// GET /sessions/{id} - Fetch one deliberation snapshot
pub async fn get_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.sessions.get(&RequestId::new(id)).await {
        Ok(Some(session)) => Json(session).into_response(),
        Ok(None) => not_found(),
        Err(error) => storage_error(error),
    }
}

/// DELETE /sessions/{id} - Remove one deliberation from history
pub async fn delete_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.sessions.delete(&RequestId::new(id)).await {
        Ok(true) => Json(serde_json::json!({ "success": true })).into_response(),
        Ok(false) => not_found(),
        Err(error) => storage_error(error),
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Session not found" })),
    )
        .into_response()
}

fn storage_error(error: SessionStoreError) -> Response {
    warn!(%error, "session store failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": error.to_string() })),
    )
        .into_response()
}
