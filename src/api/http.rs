//! HTTP server setup with Axum

use std::sync::Arc;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::rest::units;
use super::ws::{handler::ws_handler, state::AppState};

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket endpoint
        .route("/ws", get(ws_handler))
        // Health check
        .route("/health", get(health_check))
        // Inbound commands and queries
        .route("/api/units", get(units::list_units).post(units::create_unit))
        .route("/api/units/:id", get(units::get_unit))
        .route("/api/units/:id", delete(units::delete_unit))
        .route("/api/units/:id/start", post(units::start_unit))
        .route("/api/units/:id/stop", post(units::stop_unit))
        .route("/api/units/:id/rename", post(units::rename_unit))
        .route("/api/units/:id/content", put(units::update_content))
        .route("/api/units/:id/handshake", post(units::handshake))
        .route(
            "/api/units/:id/logs",
            get(units::read_logs).delete(units::clear_logs),
        )
        .route("/api/units/:id/logs/export", get(units::export_logs))
        .route("/api/units/:id/versions", get(units::list_versions))
        .route("/api/units/:id/rollback", post(units::rollback))
        .route("/api/units/:id/stats", get(units::unit_stats))
        // External collaborator: network-egress stats relay
        .route("/api/egress-stats", post(units::relay_egress_stats))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
