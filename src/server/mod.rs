//! HTTP API: frame analysis, enrollment and per-student risk inspection.

mod error;
mod handlers;

pub use error::{ApiError, ApiResult};
pub use handlers::{EnrollResponse, EnrollStatus};

use crate::config::ServerConfig;
use crate::orchestrator::FrameAnalyzer;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Room for multipart framing and the text fields on top of the image itself.
/// Bodies past the limit fail inside the multipart reader and surface as a JSON 413.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<FrameAnalyzer>,
}

pub fn router(state: AppState, max_frame_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/analyze_frame", post(handlers::analyze_frame))
        .route("/enroll", post(handlers::enroll))
        .route(
            "/students/:id",
            get(handlers::student).delete(handlers::end_session),
        )
        .layer(DefaultBodyLimit::max(max_frame_bytes + FORM_OVERHEAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl+C.
pub async fn serve(config: &ServerConfig, analyzer: Arc<FrameAnalyzer>) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "monitor API listening");
    let app = router(AppState { analyzer }, config.max_frame_bytes);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
