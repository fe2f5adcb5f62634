//! League endpoints
//!
//! Start times arrive as wall-clock values and are read in the acting
//! player's timezone.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::repos::{
    League, LeagueDetail, LeagueEdit, LeagueRepo, LeaderboardRepo, Leaderboards, NewLeague,
    PlayerLeagues, PlayerRepo, RoundSubmission,
};
use crate::http::error::ApiError;
use crate::http::extractors::{query_id, ApiJson, ApiQuery, ValidId, ValidIdPair};
use crate::http::server::AppState;
use crate::models::league::{parse_start_time, validate_description, validate_league_name};
use crate::models::{
    check_id, required, LeagueSettings, LeagueSettingsInput, PrivacyType, Timezone,
    ValidationError,
};

#[derive(Debug, Deserialize)]
pub struct PlayerQuery {
    pub player_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLeagueRequest {
    pub creator_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub privacy_type: Option<String>,
    #[serde(default)]
    pub settings: LeagueSettingsInput,
    pub start_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLeagueRequest {
    pub editor_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub privacy_type: Option<String>,
    pub settings: Option<LeagueSettingsInput>,
    pub start_time: Option<String>,
}

impl UpdateLeagueRequest {
    fn into_edit(self, start_time: Option<DateTime<Utc>>) -> Result<LeagueEdit, ApiError> {
        Ok(LeagueEdit {
            name: self.name.as_deref().map(validate_league_name).transpose()?,
            description: description_field(self.description.as_deref())?,
            privacy_type: self.privacy_type.as_deref().map(PrivacyType::parse).transpose()?,
            settings: self.settings,
            start_time,
        })
    }
}

/// Trim and check a description. A blank one comes back as `Some(None)`.
fn description_field(raw: Option<&str>) -> Result<Option<Option<String>>, ValidationError> {
    raw.map(|d| validate_description(d).map(|d| Some(d).filter(|d| !d.is_empty())))
        .transpose()
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub player_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub inviter_id: Option<i64>,
    pub invitee_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RoundSubmitRequest {
    pub player_id: Option<i64>,
    pub session_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LeagueLeaderboard {
    pub league_id: i64,
    #[serde(flatten)]
    pub boards: Leaderboards,
    pub updated_at: DateTime<Utc>,
}

/// Wall-clock start time read in the player's stored timezone
async fn start_time_for(
    state: &AppState,
    player_id: i64,
    raw: &str,
) -> Result<DateTime<Utc>, ApiError> {
    let player = PlayerRepo::new(&state.pool).get(player_id).await?;
    Ok(parse_start_time(raw, Timezone::or_utc(&player.timezone))?)
}

/// GET /api/leagues?player_id=
async fn list_leagues(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<PlayerQuery>,
) -> Result<Json<PlayerLeagues>, ApiError> {
    let player_id = query_id("player_id", params.player_id.as_deref())?;
    let leagues = LeagueRepo::new(&state.pool).list_for_player(player_id).await?;
    Ok(Json(leagues))
}

/// POST /api/leagues
async fn create_league(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateLeagueRequest>,
) -> Result<(StatusCode, Json<LeagueDetail>), ApiError> {
    let creator_id = check_id("creator_id", required("creator_id", req.creator_id)?)?;
    let name = validate_league_name(&required("name", req.name)?)?;
    let description = description_field(req.description.as_deref())?.flatten();
    let privacy_type = req
        .privacy_type
        .as_deref()
        .map(PrivacyType::parse)
        .transpose()?
        .unwrap_or(PrivacyType::Public);
    let settings = req.settings.apply(LeagueSettings::default())?;
    let raw_start = required("start_time", req.start_time)?;

    let start_time = start_time_for(&state, creator_id, &raw_start).await?;

    let detail = LeagueRepo::new(&state.pool)
        .create(NewLeague {
            creator_id,
            name,
            description,
            privacy_type,
            settings,
            start_time,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/leagues/{id}
async fn get_league(
    State(state): State<Arc<AppState>>,
    ValidId(league_id): ValidId,
) -> Result<Json<LeagueDetail>, ApiError> {
    let detail = LeagueRepo::new(&state.pool).detail(league_id).await?;
    Ok(Json(detail))
}

/// PUT /api/leagues/{id}
async fn update_league(
    State(state): State<Arc<AppState>>,
    ValidId(league_id): ValidId,
    ApiJson(req): ApiJson<UpdateLeagueRequest>,
) -> Result<Json<LeagueDetail>, ApiError> {
    let editor_id = check_id("editor_id", required("editor_id", req.editor_id)?)?;

    let start_time = match req.start_time.as_deref() {
        Some(raw) => Some(start_time_for(&state, editor_id, raw).await?),
        None => None,
    };
    let edit = req.into_edit(start_time)?;

    let detail = LeagueRepo::new(&state.pool)
        .update(league_id, editor_id, edit)
        .await?;
    Ok(Json(detail))
}

/// DELETE /api/leagues/{id}?player_id=
async fn delete_league(
    State(state): State<Arc<AppState>>,
    ValidId(league_id): ValidId,
    ApiQuery(params): ApiQuery<PlayerQuery>,
) -> Result<Json<ActionResponse>, ApiError> {
    let player_id = query_id("player_id", params.player_id.as_deref())?;
    LeagueRepo::new(&state.pool).delete(league_id, player_id).await?;
    Ok(Json(ActionResponse {
        success: true,
        message: "League deleted",
    }))
}

/// POST /api/leagues/{id}/join
async fn join_league(
    State(state): State<Arc<AppState>>,
    ValidId(league_id): ValidId,
    ApiJson(req): ApiJson<JoinRequest>,
) -> Result<Json<League>, ApiError> {
    let player_id = check_id("player_id", required("player_id", req.player_id)?)?;
    let league = LeagueRepo::new(&state.pool).join(league_id, player_id).await?;
    Ok(Json(league))
}

/// DELETE /api/leagues/{id}/join?player_id=
async fn leave_league(
    State(state): State<Arc<AppState>>,
    ValidId(league_id): ValidId,
    ApiQuery(params): ApiQuery<PlayerQuery>,
) -> Result<Json<ActionResponse>, ApiError> {
    let player_id = query_id("player_id", params.player_id.as_deref())?;
    LeagueRepo::new(&state.pool).leave(league_id, player_id).await?;
    Ok(Json(ActionResponse {
        success: true,
        message: "Left league",
    }))
}

/// POST /api/leagues/{id}/invite
async fn invite(
    State(state): State<Arc<AppState>>,
    ValidId(league_id): ValidId,
    ApiJson(req): ApiJson<InviteRequest>,
) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
    let inviter_id = check_id("inviter_id", required("inviter_id", req.inviter_id)?)?;
    let invitee_id = check_id("invitee_id", required("invitee_id", req.invitee_id)?)?;
    if inviter_id == invitee_id {
        return Err(ApiError::BadRequest {
            message: "cannot invite yourself".into(),
        });
    }

    LeagueRepo::new(&state.pool)
        .invite(league_id, inviter_id, invitee_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ActionResponse {
            success: true,
            message: "Invitation sent",
        }),
    ))
}

/// GET /api/leagues/{id}/leaderboard
async fn league_leaderboard(
    State(state): State<Arc<AppState>>,
    ValidId(league_id): ValidId,
) -> Result<Json<LeagueLeaderboard>, ApiError> {
    let boards = LeaderboardRepo::new(&state.pool).league(league_id).await?;
    Ok(Json(LeagueLeaderboard {
        league_id,
        boards,
        updated_at: Utc::now(),
    }))
}

/// POST /api/leagues/{id}/rounds/{round_id}/submit
async fn submit_round(
    State(state): State<Arc<AppState>>,
    ValidIdPair(league_id, round_id): ValidIdPair,
    ApiJson(req): ApiJson<RoundSubmitRequest>,
) -> Result<(StatusCode, Json<RoundSubmission>), ApiError> {
    let player_id = check_id("player_id", required("player_id", req.player_id)?)?;
    let session_id = check_id("session_id", required("session_id", req.session_id)?)?;

    let submission = LeagueRepo::new(&state.pool)
        .submit_round(league_id, round_id, player_id, session_id)
        .await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

/// League routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/leagues", get(list_leagues).post(create_league))
        .route(
            "/api/leagues/{id}",
            get(get_league).put(update_league).delete(delete_league),
        )
        .route("/api/leagues/{id}/join", post(join_league).delete(leave_league))
        .route("/api/leagues/{id}/invite", post(invite))
        .route("/api/leagues/{id}/leaderboard", get(league_leaderboard))
        .route(
            "/api/leagues/{id}/rounds/{round_id}/submit",
            post(submit_round),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(json: &str) -> LeagueEdit {
        serde_json::from_str::<UpdateLeagueRequest>(json)
            .unwrap()
            .into_edit(None)
            .unwrap()
    }

    #[test]
    fn blank_description_clears_on_edit() {
        assert_eq!(edit(r#"{"editor_id": 1, "description": "   "}"#).description, Some(None));
        assert_eq!(edit(r#"{"editor_id": 1, "description": ""}"#).description, Some(None));
        assert_eq!(
            edit(r#"{"editor_id": 1, "description": " Weekly ladder "}"#).description,
            Some(Some("Weekly ladder".to_owned()))
        );
        assert_eq!(edit(r#"{"editor_id": 1, "name": "Club"}"#).description, None);
    }

    #[test]
    fn blank_description_is_absent_on_create() {
        assert_eq!(description_field(Some(" ")).unwrap().flatten(), None);
        assert!(description_field(Some("x".repeat(5000).as_str())).is_err());
    }

    #[test]
    fn create_request_defaults_settings() {
        let req: CreateLeagueRequest = serde_json::from_str(
            r#"{"creator_id": 1, "name": "Tuesday Club", "start_time": "2026-11-03T18:00"}"#,
        )
        .unwrap();
        let settings = req.settings.apply(LeagueSettings::default()).unwrap();
        assert_eq!(settings, LeagueSettings::default());
        assert!(req.privacy_type.is_none());
    }

    #[test]
    fn out_of_range_rounds_fail_validation() {
        let req: CreateLeagueRequest = serde_json::from_str(
            r#"{"creator_id": 1, "name": "x", "settings": {"num_rounds": 0}}"#,
        )
        .unwrap();
        assert!(req.settings.apply(LeagueSettings::default()).is_err());
    }

    #[test]
    fn leaderboard_flattens_boards() {
        let body = serde_json::to_value(LeagueLeaderboard {
            league_id: 3,
            boards: Leaderboards {
                top_makes: vec![],
                top_streaks: vec![],
                top_makes_per_minute: vec![],
                fastest_21: vec![],
            },
            updated_at: Utc::now(),
        })
        .unwrap();
        assert_eq!(body["league_id"], 3);
        assert!(body["top_makes"].is_array());
        assert!(body["fastest_21"].is_array());
    }
}
