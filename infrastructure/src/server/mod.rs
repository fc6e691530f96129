//! Axum server setup and lifecycle
//!
//! Routes, shared state, CORS, and graceful shutdown. The HTTP surface
//! is deliberately small: health, prompt, session history, and the one
//! WebSocket endpoint the extension connects to.

pub mod handlers;
pub mod payloads;
pub mod ws;

use crate::bridge::CouncilBridge;
use axum::Router;
use axum::routing::{get, post};
use council_application::{SessionStore, SubmitCouncilUseCase};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Errors starting or running the HTTP server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<CouncilBridge>,
    pub submit: Arc<SubmitCouncilUseCase<CouncilBridge>>,
    pub sessions: Arc<dyn SessionStore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        bridge: Arc<CouncilBridge>,
        submit: Arc<SubmitCouncilUseCase<CouncilBridge>>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            bridge,
            submit,
            sessions,
            started_at: Instant::now(),
        }
    }

}

/// Build the router with all routes and permissive CORS (the caller is
/// a phone on a mesh network, not a browser origin we control).
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/prompt", post(handlers::prompt_handler))
        .route("/sessions", get(handlers::list_sessions_handler))
        .route(
            "/sessions/{id}",
            get(handlers::get_session_handler).delete(handlers::delete_session_handler),
        )
        .route("/ws", get(ws::ws_handler))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the cancellation token fires.
pub async fn serve(
    addr: &str,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    info!("council server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            info!("shutdown signal received");
        })
        .await?;

    info!("council server stopped");
    Ok(())
}
