//! Player profile endpoints
//!
//! The dashboard aggregate built here is also what login and register return.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::repos::sessions::apply_history_locks;
use crate::db::repos::{
    Calibration, Player, PlayerAggregate, PlayerRepo, PlayerStats, PlayerSummary, ProfileUpdate,
    Session,
};
use crate::http::error::ApiError;
use crate::http::extractors::{query_id, ApiJson, ApiQuery, ValidId};
use crate::http::server::AppState;
use crate::models::player::EARLY_ACCESS_CODE;
use crate::models::{
    required, validate_link, Email, MembershipTier, NotificationPreferences, PlayerName, Timezone,
    ValidationError,
};

/// Dashboard payload: profile, career stats, recent sessions, calibration
#[derive(Debug, Serialize)]
pub struct PlayerData {
    #[serde(flatten)]
    pub player: Player,
    pub stats: PlayerStats,
    pub sessions: Vec<Session>,
    pub calibration_data: Calibration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new_user: Option<bool>,
}

impl From<PlayerAggregate> for PlayerData {
    fn from(agg: PlayerAggregate) -> Self {
        let player_id = agg.player.player_id;
        let mut sessions = agg.sessions;
        apply_history_locks(&mut sessions, agg.player.is_subscribed());

        Self {
            stats: agg.stats.unwrap_or_else(|| PlayerStats::empty(player_id)),
            calibration_data: agg
                .calibration
                .unwrap_or_else(|| Calibration::uncalibrated(player_id)),
            sessions,
            player: agg.player,
            is_new_user: None,
        }
    }
}

impl PlayerData {
    pub fn new_user(mut self, is_new: bool) -> Self {
        self.is_new_user = Some(is_new);
        self
    }
}

/// Profile edit; omitted fields are left alone, empty links are cleared
#[derive(Debug, Deserialize)]
pub struct UpdatePlayerRequest {
    pub player_id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub timezone: Option<String>,
    pub x_url: Option<String>,
    pub tiktok_url: Option<String>,
    pub website_url: Option<String>,
}

impl UpdatePlayerRequest {
    fn into_update(self) -> Result<ProfileUpdate, ValidationError> {
        Ok(ProfileUpdate {
            name: self.name.as_deref().map(PlayerName::new).transpose()?,
            email: self.email.as_deref().map(Email::new).transpose()?,
            timezone: self.timezone.as_deref().map(Timezone::new).transpose()?,
            x_url: self.x_url.map(|s| validate_link("x_url", &s)).transpose()?,
            tiktok_url: self
                .tiktok_url
                .map(|s| validate_link("tiktok_url", &s))
                .transpose()?,
            website_url: self
                .website_url
                .map(|s| validate_link("website_url", &s))
                .transpose()?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub player_id: i64,
    pub settings: Settings,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub notifications: NotificationPreferences,
}

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub coupon_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub success: bool,
    pub message: &'static str,
    pub membership_tier: String,
    pub subscription_status: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub search_term: Option<String>,
    pub player_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub players: Vec<PlayerSummary>,
}

/// GET /api/player/{id}/data - dashboard aggregate
async fn player_data(
    State(state): State<Arc<AppState>>,
    ValidId(player_id): ValidId,
) -> Result<Json<PlayerData>, ApiError> {
    let agg = PlayerRepo::new(&state.pool).aggregate(player_id).await?;
    Ok(Json(PlayerData::from(agg)))
}

/// PUT /api/player/{id} - profile edit
async fn update_player(
    State(state): State<Arc<AppState>>,
    ValidId(player_id): ValidId,
    ApiJson(req): ApiJson<UpdatePlayerRequest>,
) -> Result<Json<Player>, ApiError> {
    if req.player_id.is_some_and(|body_id| body_id != player_id) {
        return Err(ApiError::Forbidden {
            reason: "cannot update another player's profile".into(),
        });
    }

    let update = req.into_update()?;
    if update.is_empty() {
        return Err(ApiError::BadRequest {
            message: "no updatable fields provided".into(),
        });
    }

    let player = PlayerRepo::new(&state.pool)
        .update_profile(player_id, update)
        .await?;
    Ok(Json(player))
}

/// GET /api/player/{id}/settings
async fn get_settings(
    State(state): State<Arc<AppState>>,
    ValidId(player_id): ValidId,
) -> Result<Json<SettingsResponse>, ApiError> {
    let notifications = PlayerRepo::new(&state.pool).preferences(player_id).await?;
    Ok(Json(SettingsResponse {
        player_id,
        settings: Settings { notifications },
    }))
}

/// PUT /api/player/{id}/settings
async fn put_settings(
    State(state): State<Arc<AppState>>,
    ValidId(player_id): ValidId,
    ApiJson(settings): ApiJson<Settings>,
) -> Result<Json<SettingsResponse>, ApiError> {
    PlayerRepo::new(&state.pool)
        .set_preferences(player_id, &settings.notifications)
        .await?;
    Ok(Json(SettingsResponse { player_id, settings }))
}

/// POST /api/player/{id}/redeem-coupon
async fn redeem_coupon(
    State(state): State<Arc<AppState>>,
    ValidId(player_id): ValidId,
    ApiJson(req): ApiJson<RedeemRequest>,
) -> Result<Json<RedeemResponse>, ApiError> {
    let code = required("coupon_code", req.coupon_code)?;
    let code = code.trim();
    if code != EARLY_ACCESS_CODE {
        return Err(ApiError::BadRequest {
            message: "invalid coupon code".into(),
        });
    }

    let player = PlayerRepo::new(&state.pool)
        .set_tier(player_id, MembershipTier::Premium, code)
        .await?;

    Ok(Json(RedeemResponse {
        success: true,
        message: "Coupon redeemed",
        membership_tier: player.membership_tier,
        subscription_status: player.subscription_status,
    }))
}

/// GET /api/players/search?search_term=&player_id=
async fn search_players(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let term = required("search_term", params.search_term)?;
    let term = term.trim();
    if term.is_empty() {
        return Err(ValidationError::Empty {
            field: "search_term",
        }
        .into());
    }
    let exclude = params
        .player_id
        .as_deref()
        .map(|raw| query_id("player_id", Some(raw)))
        .transpose()?;

    let players = PlayerRepo::new(&state.pool).search(term, exclude).await?;
    Ok(Json(SearchResponse { players }))
}

/// Player routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/player/{id}/data", get(player_data))
        .route("/api/player/{id}", put(update_player))
        .route("/api/player/{id}/settings", get(get_settings).put(put_settings))
        .route("/api/player/{id}/redeem-coupon", post(redeem_coupon))
        .route("/api/players/search", get(search_players))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn player(status: &str) -> Player {
        Player {
            player_id: 7,
            email: "pop@example.com".into(),
            name: "Pop".into(),
            membership_tier: "basic".into(),
            subscription_status: status.into(),
            early_access_code: None,
            timezone: "UTC".into(),
            x_url: None,
            tiktok_url: None,
            website_url: None,
            created_at: Utc::now(),
        }
    }

    fn session(id: i64) -> Session {
        Session {
            session_id: id,
            player_id: 7,
            status: "completed".into(),
            start_time: Utc::now(),
            end_time: None,
            total_putts: 10,
            total_makes: 6,
            total_misses: 4,
            best_streak: 3,
            fastest_21_makes: None,
            most_makes_in_60_seconds: Some(4),
            putts_per_minute: 1.0,
            makes_per_minute: 0.6,
            session_duration: 600.0,
            makes_by_category: None,
            misses_by_category: None,
            client_session_id: None,
            is_locked: false,
        }
    }

    #[test]
    fn missing_related_rows_degrade_to_defaults() {
        let data = PlayerData::from(PlayerAggregate {
            player: player("free"),
            stats: None,
            sessions: vec![],
            calibration: None,
        });

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["player_id"], 7);
        assert_eq!(json["stats"]["total_putts"], 0);
        assert_eq!(json["calibration_data"]["is_calibrated"], false);
        assert!(json.get("is_new_user").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn free_players_see_only_latest_session_in_full() {
        let data = PlayerData::from(PlayerAggregate {
            player: player("free"),
            stats: None,
            sessions: vec![session(3), session(2), session(1)],
            calibration: None,
        });

        assert!(!data.sessions[0].is_locked);
        assert!(data.sessions[1..].iter().all(|s| s.is_locked));
        assert!(data.sessions[1].most_makes_in_60_seconds.is_none());
    }

    #[test]
    fn subscribers_see_everything() {
        let data = PlayerData::from(PlayerAggregate {
            player: player("active"),
            stats: None,
            sessions: vec![session(2), session(1)],
            calibration: None,
        })
        .new_user(false);

        assert!(data.sessions.iter().all(|s| !s.is_locked));
        assert_eq!(data.is_new_user, Some(false));
    }

    #[test]
    fn profile_update_validates_fields() {
        let req = UpdatePlayerRequest {
            player_id: None,
            name: None,
            email: None,
            timezone: Some("Mars/Olympus".into()),
            x_url: None,
            tiktok_url: None,
            website_url: None,
        };
        assert!(req.into_update().is_err());

        let req = UpdatePlayerRequest {
            player_id: None,
            name: Some(" Pop ".into()),
            email: None,
            timezone: Some("Europe/Dublin".into()),
            x_url: Some(String::new()),
            tiktok_url: None,
            website_url: None,
        };
        let update = req.into_update().unwrap();
        assert_eq!(update.name.unwrap().as_str(), "Pop");
        assert_eq!(update.x_url.as_deref(), Some(""));
    }
}
