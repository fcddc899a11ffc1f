//! REST API over the validator and the wizard session.
//!
//! Provides three POST endpoints:
//! - `/validate`: raw form input → error set
//! - `/replay`: session script → replay report
//! - `/submit`: raw form input → accepted configuration or 422

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::post;
use tracing::info;

use crate::config::WizardConfig;

pub use types::{ErrorResponse, SubmitResponse, ValidateResponse};

/// Immutable application state shared across all request handlers.
///
/// Every request builds its own session from this, so no locks are needed.
pub struct AppState {
    /// Field policy and defaults in force.
    pub config: WizardConfig,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/validate", post(handlers::post_validate))
        .route("/replay", post(handlers::post_replay))
        .route("/submit", post(handlers::post_submit))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process ends.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
