//! Global leaderboard endpoint

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::repos::{LeaderboardRepo, Leaderboards};
use crate::http::error::ApiError;
use crate::http::extractors::ApiQuery;
use crate::http::server::AppState;
use crate::models::{LeaderboardType, Timeframe};

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub timeframe: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    #[serde(flatten)]
    pub boards: Leaderboards,
    #[serde(rename = "type")]
    pub kind: LeaderboardType,
    pub timeframe: Timeframe,
    pub updated_at: DateTime<Utc>,
}

/// GET /api/leaderboards?type=global&timeframe=weekly|monthly|all_time
async fn leaderboards(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<LeaderboardParams>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let kind = LeaderboardType::parse(params.kind.as_deref())?;
    let timeframe = Timeframe::parse(params.timeframe.as_deref())?;
    let now = Utc::now();

    let boards = LeaderboardRepo::new(&state.pool)
        .global(timeframe.since(now))
        .await?;

    Ok(Json(LeaderboardResponse {
        boards,
        kind,
        timeframe,
        updated_at: now,
    }))
}

/// Leaderboard routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/leaderboards", get(leaderboards))
}
