//! Duel endpoints
//!
//! pending -> active -> completed, or pending -> declined | expired.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::repos::{Duel, DuelRepo, HeadToHead};
use crate::http::error::ApiError;
use crate::http::extractors::{query_id, ApiJson, ApiQuery, ValidId, ValidIdPair};
use crate::http::server::AppState;
use crate::models::duel::ensure_distinct_players;
use crate::models::{check_id, required, DuelResponse, DuelSettingsInput};

#[derive(Debug, Deserialize)]
pub struct DuelQuery {
    pub player_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DuelList {
    pub duels: Vec<Duel>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDuelRequest {
    pub creator_id: Option<i64>,
    pub invited_player_id: Option<i64>,
    #[serde(default)]
    pub settings: DuelSettingsInput,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub player_id: Option<i64>,
    pub response: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub player_id: Option<i64>,
    pub session_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HeadToHeadResponse {
    pub player1_id: i64,
    pub player2_id: i64,
    pub duels: Vec<Duel>,
    pub head_to_head: HeadToHead,
}

/// GET /api/duels?player_id=
async fn list_duels(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<DuelQuery>,
) -> Result<Json<DuelList>, ApiError> {
    let player_id = query_id("player_id", params.player_id.as_deref())?;
    let duels = DuelRepo::new(&state.pool).list_for_player(player_id).await?;
    Ok(Json(DuelList { duels }))
}

/// POST /api/duels
async fn create_duel(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateDuelRequest>,
) -> Result<(StatusCode, Json<Duel>), ApiError> {
    let creator_id = check_id("creator_id", required("creator_id", req.creator_id)?)?;
    let invited_id = check_id(
        "invited_player_id",
        required("invited_player_id", req.invited_player_id)?,
    )?;
    ensure_distinct_players(creator_id, invited_id)?;
    let settings = req.settings.validate()?;

    let duel = DuelRepo::new(&state.pool)
        .create(creator_id, invited_id, settings)
        .await?;
    Ok((StatusCode::CREATED, Json(duel)))
}

/// POST /api/duels/{id}/respond
async fn respond(
    State(state): State<Arc<AppState>>,
    ValidId(duel_id): ValidId,
    ApiJson(req): ApiJson<RespondRequest>,
) -> Result<Json<Duel>, ApiError> {
    let player_id = check_id("player_id", required("player_id", req.player_id)?)?;
    let response = DuelResponse::parse(&required("response", req.response)?)?;

    let duel = DuelRepo::new(&state.pool)
        .respond(duel_id, player_id, response)
        .await?;
    Ok(Json(duel))
}

/// POST /api/duels/{id}/submit
async fn submit(
    State(state): State<Arc<AppState>>,
    ValidId(duel_id): ValidId,
    ApiJson(req): ApiJson<SubmitRequest>,
) -> Result<Json<Duel>, ApiError> {
    let player_id = check_id("player_id", required("player_id", req.player_id)?)?;
    let session_id = check_id("session_id", required("session_id", req.session_id)?)?;

    let duel = DuelRepo::new(&state.pool)
        .submit(duel_id, player_id, session_id)
        .await?;
    Ok(Json(duel))
}

/// GET /api/players/{p1}/vs/{p2}/duels
async fn head_to_head(
    State(state): State<Arc<AppState>>,
    ValidIdPair(player1_id, player2_id): ValidIdPair,
) -> Result<Json<HeadToHeadResponse>, ApiError> {
    let duels = DuelRepo::new(&state.pool)
        .between(player1_id, player2_id)
        .await?;
    let head_to_head = HeadToHead::tally(&duels, player1_id, player2_id);

    Ok(Json(HeadToHeadResponse {
        player1_id,
        player2_id,
        duels,
        head_to_head,
    }))
}

/// Duel routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/duels", get(list_duels).post(create_duel))
        .route("/api/duels/{id}/respond", post(respond))
        .route("/api/duels/{id}/submit", post(submit))
        .route("/api/players/{p1}/vs/{p2}/duels", get(head_to_head))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_are_optional() {
        let req: CreateDuelRequest =
            serde_json::from_str(r#"{"creator_id": 1, "invited_player_id": 2}"#).unwrap();
        let settings = req.settings.validate().unwrap();
        assert_eq!(settings.session_duration_limit_minutes, 15);
        assert_eq!(settings.invitation_expiry_minutes, 4320);
    }

    #[test]
    fn explicit_settings_are_read() {
        let req: CreateDuelRequest = serde_json::from_str(
            r#"{"creator_id": 1, "invited_player_id": 2,
                "settings": {"session_duration_limit_minutes": 5}}"#,
        )
        .unwrap();
        let settings = req.settings.validate().unwrap();
        assert_eq!(settings.session_duration_limit_minutes, 5);
    }
}
