//! Router assembly and server startup.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::routes;
use crate::core::{JobStore, Orchestrator};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<JobStore>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, store: Arc<JobStore>) -> Self {
        Self {
            orchestrator,
            store,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/analyze", post(routes::analyze))
        .route("/api/result/{id}", get(routes::get_result))
        .route("/api/analyses", get(routes::list_analyses))
        .route("/api/media/audio/{id}", get(routes::get_audio))
        .route(
            "/api/media/fallback-screenshot",
            get(routes::fallback_screenshot),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "HTTP server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
