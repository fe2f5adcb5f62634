//! Putting session endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::repos::sessions::apply_history_locks;
use crate::db::repos::{DesktopSubmission, PlayerRepo, Session, SessionRepo, SessionUpdate};
use crate::http::error::ApiError;
use crate::http::extractors::{query_id, ApiJson, ApiQuery, ValidId};
use crate::http::server::AppState;
use crate::models::putt_log::classified;
use crate::models::{
    check_id, required, CategoryCounts, Pagination, PaginationParams, PuttLogEntry,
    SessionCounts, SessionReport, SessionStatus,
};

/// Most sessions returned by the unpaginated list
const SESSION_LIST_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct PlayerQuery {
    pub player_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionList {
    pub player_id: i64,
    pub sessions: Vec<Session>,
}

#[derive(Debug, Serialize)]
pub struct SessionPage {
    pub sessions: Vec<Session>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_sessions: i64,
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub player_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    pub session_id: Option<i64>,
    pub player_id: Option<i64>,
    pub total_makes: Option<u32>,
    pub total_misses: Option<u32>,
    #[serde(default)]
    pub best_streak: u32,
    pub fastest_21_makes: Option<f64>,
    pub most_makes_in_60_seconds: Option<u32>,
    /// Seconds
    pub session_duration: Option<f64>,
    pub makes_by_category: Option<CategoryCounts>,
    pub misses_by_category: Option<CategoryCounts>,
    pub status: Option<SessionStatus>,
}

impl UpdateSessionRequest {
    fn into_update(self) -> Result<SessionUpdate, ApiError> {
        let counts = SessionCounts {
            makes: required("total_makes", self.total_makes)?,
            misses: required("total_misses", self.total_misses)?,
            best_streak: self.best_streak,
            fastest_21_makes: self.fastest_21_makes,
            most_makes_in_60_seconds: self.most_makes_in_60_seconds,
        };
        counts.validate()?;

        if let Some(duration) = self.session_duration {
            if !duration.is_finite() || duration < 0.0 {
                return Err(ApiError::BadRequest {
                    message: "session_duration must be a non-negative number of seconds".into(),
                });
            }
        }

        Ok(SessionUpdate {
            session_id: check_id("session_id", required("session_id", self.session_id)?)?,
            player_id: check_id("player_id", required("player_id", self.player_id)?)?,
            counts,
            session_duration: self.session_duration,
            makes_by_category: self.makes_by_category,
            misses_by_category: self.misses_by_category,
            complete: self.status.unwrap_or(SessionStatus::Completed) == SessionStatus::Completed,
        })
    }
}

/// Whole-session upload from the desktop tracker
#[derive(Debug, Deserialize)]
pub struct SubmitSessionRequest {
    pub session_data: Option<SubmittedSession>,
    pub verification: Option<SubmissionCheck>,
    pub source: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmittedSession {
    #[serde(default)]
    pub metadata: SubmissionMetadata,
    #[serde(default)]
    pub putt_log_entries: Vec<PuttLogEntry>,
    pub session_summary: Option<SubmissionSummary>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmissionMetadata {
    /// Tracker's own id, string or number
    pub session_id: Option<Value>,
    pub player_id: Option<i64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionSummary {
    pub total_putts: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionCheck {
    pub classification_count: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    /// Stored session; absent when the log held no classified putts
    pub session_id: Option<i64>,
    pub client_session_id: Option<String>,
    pub putts_processed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<SessionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SessionVerification {
    pub verified: bool,
    pub session_id: i64,
    pub client_session_id: Option<String>,
    pub status: String,
    pub processed_at: Option<DateTime<Utc>>,
    pub putt_count: i32,
}

impl From<Session> for SessionVerification {
    fn from(session: Session) -> Self {
        Self {
            verified: session.is_completed(),
            session_id: session.session_id,
            processed_at: session.end_time,
            putt_count: session.total_putts,
            client_session_id: session.client_session_id,
            status: session.status,
        }
    }
}

fn client_session_id(raw: Option<Value>) -> Option<String> {
    match raw? {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_owned()).filter(|s| !s.is_empty()),
        other => Some(other.to_string()),
    }
}

impl SubmitSessionRequest {
    fn into_submission(self) -> Result<DesktopSubmission, ApiError> {
        let data = required("session_data", self.session_data)?;
        let check = required("verification", self.verification)?;
        let metadata = data.metadata;
        let player_id = check_id("player_id", required("player_id", metadata.player_id)?)?;
        let client_session_id = client_session_id(metadata.session_id);

        let reported = data.session_summary.and_then(|s| s.total_putts);
        if let (Some(expected), Some(reported)) = (check.classification_count, reported) {
            if expected != reported {
                tracing::warn!(
                    player_id,
                    client_session_id = client_session_id.as_deref().unwrap_or("-"),
                    expected,
                    reported,
                    "putt count mismatch in desktop submission"
                );
            }
        }

        let putt_list = classified(data.putt_log_entries);
        let report = SessionReport::from_entries(&putt_list)?;

        Ok(DesktopSubmission {
            player_id,
            client_session_id,
            start_time: metadata.start_time,
            end_time: metadata.end_time,
            report,
            putt_list,
        })
    }
}

/// GET /api/sessions?player_id= - newest first
async fn list_sessions(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<PlayerQuery>,
) -> Result<Json<SessionList>, ApiError> {
    let player_id = query_id("player_id", params.player_id.as_deref())?;
    let sessions = SessionRepo::new(&state.pool)
        .list_for_player(player_id, SESSION_LIST_LIMIT)
        .await?;
    Ok(Json(SessionList {
        player_id,
        sessions,
    }))
}

/// POST /api/sessions - start a session
async fn start_session(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<StartSessionRequest>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let player_id = check_id("player_id", required("player_id", req.player_id)?)?;
    let session = SessionRepo::new(&state.pool).start(player_id).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// PUT /api/sessions - record progress or finish
async fn update_session(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<UpdateSessionRequest>,
) -> Result<Json<Session>, ApiError> {
    let update = req.into_update()?;
    let session = SessionRepo::new(&state.pool).update(update).await?;
    Ok(Json(session))
}

/// POST /api/sessions/submit - store a session computed from a putt log
async fn submit_session(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SubmitSessionRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    tracing::info!(
        source = req.source.as_deref().unwrap_or("unknown"),
        version = req.version.as_deref().unwrap_or("unknown"),
        "desktop session received"
    );
    let submission = req.into_submission()?;
    let putts_processed = submission.putt_list.len();

    if putts_processed == 0 {
        tracing::info!(player_id = submission.player_id, "no classified putts, nothing stored");
        return Ok((
            StatusCode::OK,
            Json(SubmitResponse {
                success: true,
                session_id: None,
                client_session_id: submission.client_session_id,
                putts_processed,
                statistics: None,
                message: Some("Session received but no putts classified"),
            }),
        ));
    }

    let statistics = submission.report.clone();
    let session = SessionRepo::new(&state.pool).submit(submission).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            session_id: Some(session.session_id),
            client_session_id: session.client_session_id,
            putts_processed,
            statistics: Some(statistics),
            message: None,
        }),
    ))
}

/// GET /api/sessions/{id}/verify
async fn verify_session(
    State(state): State<Arc<AppState>>,
    ValidId(session_id): ValidId,
) -> Result<Json<SessionVerification>, ApiError> {
    let session = SessionRepo::new(&state.pool).get(session_id).await?;
    Ok(Json(SessionVerification::from(session)))
}

/// GET /api/player/{id}/sessions?page=&limit= - paginated history
async fn session_history(
    State(state): State<Arc<AppState>>,
    ValidId(player_id): ValidId,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> Result<Json<SessionPage>, ApiError> {
    let page = Pagination::from(params);
    let player = PlayerRepo::new(&state.pool).get(player_id).await?;
    let mut result = SessionRepo::new(&state.pool)
        .page_for_player(player_id, page)
        .await?;

    // Only the newest session overall stays open, and it is always on page one.
    if page.page == 1 {
        apply_history_locks(&mut result.items, player.is_subscribed());
    } else if !player.is_subscribed() {
        result.items.iter_mut().for_each(Session::lock);
    }

    Ok(Json(SessionPage {
        current_page: result.page,
        total_pages: result.total_pages(),
        total_sessions: result.total,
        limit: result.limit,
        sessions: result.items,
    }))
}

/// Session routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/sessions",
            get(list_sessions).post(start_session).put(update_session),
        )
        .route("/api/sessions/submit", post(submit_session))
        .route("/api/sessions/{id}/verify", get(verify_session))
        .route("/api/player/{id}/sessions", get(session_history))
}
