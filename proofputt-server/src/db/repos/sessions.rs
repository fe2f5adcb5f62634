//! Session repository
//!
//! - start: requires a calibrated camera
//! - update: progress or completion, completion recomputes career stats
//!   in the same transaction
//! - submit: a finished session computed from a desktop putt log, stored
//!   completed with the same stats recompute

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool};

use super::{stats, DbError};
use crate::models::{
    CategoryCounts, Paginated, Pagination, PuttLogEntry, SessionCounts, SessionMetrics,
    SessionReport, SessionStatus,
};

pub(crate) const SESSION_COLUMNS: &str = "session_id, player_id, status, start_time, end_time, \
     total_putts, total_makes, total_misses, best_streak, fastest_21_makes, \
     most_makes_in_60_seconds, putts_per_minute, makes_per_minute, session_duration, \
     makes_by_category, misses_by_category, client_session_id";

/// Session record
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Session {
    pub session_id: i64,
    pub player_id: i64,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_putts: i32,
    pub total_makes: i32,
    pub total_misses: i32,
    pub best_streak: i32,
    pub fastest_21_makes: Option<f64>,
    pub most_makes_in_60_seconds: Option<i32>,
    pub putts_per_minute: f64,
    pub makes_per_minute: f64,
    pub session_duration: f64,
    pub makes_by_category: Option<Value>,
    pub misses_by_category: Option<Value>,
    /// Id the desktop tracker gave a submitted session
    pub client_session_id: Option<String>,
    #[sqlx(skip)]
    pub is_locked: bool,
}

impl Session {
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed.as_str()
    }

    /// Hide detail fields from players without an active subscription.
    pub fn lock(&mut self) {
        self.fastest_21_makes = None;
        self.most_makes_in_60_seconds = None;
        self.makes_by_category = None;
        self.misses_by_category = None;
        self.is_locked = true;
    }
}

/// Lock every session but the most recent unless the player is subscribed.
/// Expects `sessions` newest first.
pub fn apply_history_locks(sessions: &mut [Session], subscribed: bool) {
    if subscribed {
        return;
    }
    for session in sessions.iter_mut().skip(1) {
        session.lock();
    }
}

/// Progress or completion report for an active session
#[derive(Debug, Clone)]
pub struct SessionUpdate {
    pub session_id: i64,
    pub player_id: i64,
    pub counts: SessionCounts,
    /// Seconds; defaults to time since start
    pub session_duration: Option<f64>,
    pub makes_by_category: Option<CategoryCounts>,
    pub misses_by_category: Option<CategoryCounts>,
    pub complete: bool,
}

/// A whole session uploaded by the desktop tracker
#[derive(Debug, Clone)]
pub struct DesktopSubmission {
    pub player_id: i64,
    pub client_session_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub report: SessionReport,
    /// MAKE and MISS entries only
    pub putt_list: Vec<PuttLogEntry>,
}

impl DesktopSubmission {
    /// Start and end of the session. A missing end is `now`; a missing
    /// start is the end less the logged duration.
    pub fn window(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>), DbError> {
        let ended = self.end_time.unwrap_or(now);
        let started = match self.start_time {
            Some(start) => start,
            None => chrono::Duration::try_milliseconds((self.report.session_duration * 1000.0) as i64)
                .and_then(|elapsed| ended.checked_sub_signed(elapsed))
                .ok_or_else(|| DbError::Rejected("session_duration is out of range".into()))?,
        };
        if ended < started {
            return Err(DbError::Rejected("end_time is before start_time".into()));
        }
        Ok((started, ended))
    }
}

pub struct SessionRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> SessionRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, session_id: i64) -> Result<Session, DbError> {
        sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = $1"
        ))
        .bind(session_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("session", session_id))
    }

    /// Most recent sessions for a player, newest first.
    pub async fn list_for_player(&self, player_id: i64, limit: i64) -> Result<Vec<Session>, DbError> {
        let mut conn = self.pool.acquire().await?;
        recent(&mut conn, player_id, limit).await
    }

    /// One page of a player's history.
    pub async fn page_for_player(
        &self,
        player_id: i64,
        page: Pagination,
    ) -> Result<Paginated<Session>, DbError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE player_id = $1")
            .bind(player_id)
            .fetch_one(self.pool)
            .await?;

        let items = sqlx::query_as::<_, Session>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM sessions
            WHERE player_id = $1
            ORDER BY start_time DESC, session_id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(player_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Paginated {
            items,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    /// Start a session. The player must have a calibrated camera.
    pub async fn start(&self, player_id: i64) -> Result<Session, DbError> {
        let mut tx = self.pool.begin().await?;

        let calibrated: Option<(Option<bool>,)> = sqlx::query_as(
            r#"
            SELECT c.is_calibrated
            FROM players p
            LEFT JOIN calibrations c ON c.player_id = p.player_id
            WHERE p.player_id = $1
            "#,
        )
        .bind(player_id)
        .fetch_optional(&mut *tx)
        .await?;

        match calibrated {
            None => return Err(DbError::not_found("player", player_id)),
            Some((Some(true),)) => {}
            Some(_) => {
                return Err(DbError::Rejected(
                    "camera is not calibrated; calibrate before starting a session".into(),
                ))
            }
        }

        let session = sqlx::query_as::<_, Session>(&format!(
            "INSERT INTO sessions (player_id, status, start_time) VALUES ($1, 'active', NOW()) \
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(player_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(session_id = session.session_id, player_id, "session started");
        Ok(session)
    }

    /// Record progress on, or complete, an active session.
    pub async fn update(&self, update: SessionUpdate) -> Result<Session, DbError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = $1 FOR UPDATE"
        ))
        .bind(update.session_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("session", update.session_id))?;

        if current.player_id != update.player_id {
            return Err(DbError::Forbidden(
                "session belongs to another player".into(),
            ));
        }
        if current.is_completed() {
            return Err(DbError::Conflict("session is already completed".into()));
        }

        let duration = update.session_duration.unwrap_or_else(|| {
            (Utc::now() - current.start_time).num_milliseconds() as f64 / 1000.0
        });
        let metrics = SessionMetrics::derive(update.counts.makes, update.counts.misses, duration);
        let status = if update.complete {
            SessionStatus::Completed
        } else {
            SessionStatus::Active
        };

        let session = sqlx::query_as::<_, Session>(&format!(
            r#"
            UPDATE sessions SET
                status = $2,
                end_time = CASE WHEN $2 = 'completed' THEN NOW() ELSE end_time END,
                total_putts = $3,
                total_makes = $4,
                total_misses = $5,
                best_streak = $6,
                fastest_21_makes = $7,
                most_makes_in_60_seconds = $8,
                putts_per_minute = $9,
                makes_per_minute = $10,
                session_duration = $11,
                makes_by_category = COALESCE($12, makes_by_category),
                misses_by_category = COALESCE($13, misses_by_category)
            WHERE session_id = $1
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(update.session_id)
        .bind(status.as_str())
        .bind(metrics.total_putts)
        .bind(metrics.total_makes)
        .bind(metrics.total_misses)
        .bind(update.counts.best_streak as i32)
        .bind(update.counts.fastest_21_makes)
        .bind(update.counts.most_makes_in_60_seconds.map(|n| n as i32))
        .bind(metrics.putts_per_minute)
        .bind(metrics.makes_per_minute)
        .bind(metrics.session_duration)
        .bind(update.makes_by_category.map(Json))
        .bind(update.misses_by_category.map(Json))
        .fetch_one(&mut *tx)
        .await?;

        if update.complete {
            stats::recompute(&mut *tx, update.player_id).await?;
        }

        tx.commit().await?;
        tracing::info!(
            session_id = session.session_id,
            status = %session.status,
            makes = session.total_makes,
            "session updated"
        );
        Ok(session)
    }

    /// Store a completed session computed from a putt log and fold it into
    /// career stats. A repeated `client_session_id` for the same player is a
    /// conflict.
    pub async fn submit(&self, submission: DesktopSubmission) -> Result<Session, DbError> {
        let report = &submission.report;
        let counts = report.counts();
        counts.validate().map_err(|e| DbError::Rejected(e.to_string()))?;

        let (started, ended) = submission.window(Utc::now())?;
        let metrics = SessionMetrics::derive(counts.makes, counts.misses, report.session_duration);

        let mut tx = self.pool.begin().await?;

        let session = sqlx::query_as::<_, Session>(&format!(
            r#"
            INSERT INTO sessions (
                player_id, status, start_time, end_time,
                total_putts, total_makes, total_misses, best_streak,
                fastest_21_makes, most_makes_in_60_seconds,
                putts_per_minute, makes_per_minute, session_duration,
                makes_by_category, misses_by_category, client_session_id, putt_list
            )
            VALUES ($1, 'completed', $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(submission.player_id)
        .bind(started)
        .bind(ended)
        .bind(metrics.total_putts)
        .bind(metrics.total_makes)
        .bind(metrics.total_misses)
        .bind(counts.best_streak as i32)
        .bind(counts.fastest_21_makes)
        .bind(counts.most_makes_in_60_seconds.map(|n| n as i32))
        .bind(metrics.putts_per_minute)
        .bind(metrics.makes_per_minute)
        .bind(metrics.session_duration)
        .bind(Json(&report.makes_by_category))
        .bind(Json(&report.misses_by_category))
        .bind(submission.client_session_id.as_deref())
        .bind(Json(&submission.putt_list))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).or_missing("player", submission.player_id))?;

        stats::recompute(&mut *tx, submission.player_id).await?;

        tx.commit().await?;
        tracing::info!(
            session_id = session.session_id,
            player_id = submission.player_id,
            putts = session.total_putts,
            "desktop session stored"
        );
        Ok(session)
    }
}

pub(crate) async fn recent(
    conn: &mut PgConnection,
    player_id: i64,
    limit: i64,
) -> Result<Vec<Session>, DbError> {
    let sessions = sqlx::query_as::<_, Session>(&format!(
        r#"
        SELECT {SESSION_COLUMNS}
        FROM sessions
        WHERE player_id = $1
        ORDER BY start_time DESC, session_id DESC
        LIMIT $2
        "#
    ))
    .bind(player_id)
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(sessions)
}

/// Load a session row for a duel or league submission and check it is
/// the player's and finished.
pub(crate) async fn completed_for(
    conn: &mut PgConnection,
    session_id: i64,
    player_id: i64,
) -> Result<Session, DbError> {
    let session = sqlx::query_as::<_, Session>(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = $1"
    ))
    .bind(session_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| DbError::not_found("session", session_id))?;

    if session.player_id != player_id {
        return Err(DbError::Forbidden("session belongs to another player".into()));
    }
    if !session.is_completed() {
        return Err(DbError::Rejected("session is not completed".into()));
    }
    Ok(session)
}
