//! HTTP server built on axum.
//!
//! Routes:
//! - `GET /`        upload/ask page, or a configuration-error page
//! - `POST /upload` multipart field `file`
//! - `POST /query`  JSON body `{"question": "..."}`

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use docqa_core::QaService;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Shared state for request handlers.
///
/// `service` is `None` when startup configuration failed; the process then
/// stays in the configuration-error state for its whole lifetime.
#[derive(Clone)]
pub struct AppState {
    pub service: Option<QaService>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(service: Option<QaService>) -> Self {
        Self {
            service,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/query", post(handlers::query))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(bind: &str, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    info!(%bind, "docqa listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    info!("docqa shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
