//! Desktop companion heartbeat and status

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::db::repos::{DesktopRepo, DesktopStatus};
use crate::http::error::ApiError;
use crate::http::extractors::{query_id, ApiJson, ApiQuery};
use crate::http::server::AppState;
use crate::models::{check_id, required};

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub player_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    pub player_id: Option<i64>,
    pub desktop_version: Option<String>,
    pub capabilities: Option<Value>,
}

/// GET /api/desktop/status?player_id=
async fn status(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<StatusQuery>,
) -> Result<Json<DesktopStatus>, ApiError> {
    let player_id = query_id("player_id", params.player_id.as_deref())?;
    let heartbeat = DesktopRepo::new(&state.pool).latest(player_id).await?;

    Ok(Json(DesktopStatus::evaluate(
        player_id,
        heartbeat,
        Utc::now(),
        state.heartbeat_timeout,
    )))
}

/// POST /api/desktop/heartbeat
async fn heartbeat(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<HeartbeatRequest>,
) -> Result<Json<DesktopStatus>, ApiError> {
    let player_id = check_id("player_id", required("player_id", req.player_id)?)?;
    let desktop_version = req
        .desktop_version
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty());

    let beat = DesktopRepo::new(&state.pool)
        .heartbeat(player_id, desktop_version, req.capabilities)
        .await?;

    Ok(Json(DesktopStatus::evaluate(
        player_id,
        Some(beat),
        Utc::now(),
        state.heartbeat_timeout,
    )))
}

/// Desktop routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/desktop/status", get(status))
        .route("/api/desktop/heartbeat", post(heartbeat))
}
