//! Unit command and query endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::{ApiError, ApiResponse, PaginationParams};
use crate::api::ws::state::AppState;

/// Body for POST /api/units
#[derive(Debug, Deserialize)]
pub struct CreateUnitBody {
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "autoRestart", default)]
    pub auto_restart: bool,
}

/// Body for POST /api/units/:id/rename
#[derive(Debug, Deserialize)]
pub struct RenameBody {
    pub name: String,
}

/// Body for PUT /api/units/:id/content
#[derive(Debug, Deserialize)]
pub struct ContentBody {
    pub content: String,
}

/// Body for POST /api/units/:id/rollback
#[derive(Debug, Deserialize)]
pub struct RollbackBody {
    pub version: u64,
}

/// Body for POST /api/egress-stats
#[derive(Debug, Deserialize)]
pub struct EgressStatsBody {
    #[serde(rename = "unitId")]
    pub unit_id: String,
    pub stats: Value,
}

/// GET /api/units - roster with current status
pub async fn list_units(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::new(state.supervisor.list_units()))
}

/// POST /api/units - upload a new script
pub async fn create_unit(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUnitBody>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .supervisor
        .create_unit(&body.name, &body.content, body.auto_restart)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(view))))
}

/// GET /api/units/:id - unit snapshot plus live content
pub async fn get_unit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let unit = state.supervisor.get_unit(&id)?;
    let content = state.supervisor.unit_content(&id)?;
    Ok(Json(serde_json::json!({
        "data": unit.view(),
        "content": content,
    })))
}

/// DELETE /api/units/:id
pub async fn delete_unit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.supervisor.delete_unit(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/units/:id/start
pub async fn start_unit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.supervisor.start(&id).await?;
    Ok(Json(ApiResponse::new(outcome)))
}

/// POST /api/units/:id/stop
pub async fn stop_unit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.supervisor.stop(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/units/:id/rename
pub async fn rename_unit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<RenameBody>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.supervisor.rename_unit(&id, &body.name)?;
    Ok(Json(ApiResponse::new(view)))
}

/// PUT /api/units/:id/content - commit new content (versioned)
pub async fn update_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<ContentBody>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.supervisor.update_content(&id, &body.content)?;
    Ok(Json(ApiResponse::new(created)))
}

/// POST /api/units/:id/handshake - the unit's script reports readiness
pub async fn handshake(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.supervisor.mark_connected(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/units/:id/logs?page=&limit= - newest-first pages
pub async fn read_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (entries, meta) = state
        .supervisor
        .read_logs(&id, params.page, params.normalized_limit())?;
    Ok(Json(ApiResponse::paged(entries, meta)))
}

/// DELETE /api/units/:id/logs - destructive clear
pub async fn clear_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.supervisor.clear_logs(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/units/:id/logs/export - plain text, `[HH:MM:SS] message`
pub async fn export_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let text = state.supervisor.export_logs(&id)?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

/// GET /api/units/:id/versions?page=&limit= - newest-first
pub async fn list_versions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (versions, meta) =
        state
            .supervisor
            .list_versions(&id, params.page, params.normalized_limit())?;
    Ok(Json(ApiResponse::paged(versions, meta)))
}

/// POST /api/units/:id/rollback
pub async fn rollback(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<RollbackBody>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.supervisor.rollback(&id, body.version).await?;
    Ok(Json(ApiResponse::new(outcome)))
}

/// GET /api/units/:id/stats
pub async fn unit_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.supervisor.unit_stats(&id)?;
    Ok(Json(ApiResponse::new(stats)))
}

/// POST /api/egress-stats - relay from the network-egress module, verbatim
pub async fn relay_egress_stats(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EgressStatsBody>,
) -> Result<impl IntoResponse, ApiError> {
    state.supervisor.relay_egress_stats(&body.unit_id, body.stats)?;
    Ok(StatusCode::NO_CONTENT)
}
