//! Duel repository
//!
//! Every state change locks the duel row (`FOR UPDATE`) and writes its
//! notifications in the same transaction.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};

use super::notifications;
use super::sessions;
use super::DbError;
use crate::models::{DuelOutcome, DuelResponse, DuelSettings, DuelStatus, NewNotification};

const DUEL_SELECT: &str = r#"
    SELECT
        d.duel_id,
        d.creator_id,
        c.name AS creator_name,
        d.invited_player_id,
        i.name AS invited_player_name,
        d.status,
        d.session_duration_limit_minutes,
        d.invitation_expiry_minutes,
        d.invitation_expires_at,
        d.creator_session_id,
        d.invited_session_id,
        d.creator_score,
        d.invited_score,
        d.winner_id,
        d.created_at,
        d.completed_at
    FROM duels d
    JOIN players c ON c.player_id = d.creator_id
    JOIN players i ON i.player_id = d.invited_player_id
"#;

/// Duel with participant names
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Duel {
    pub duel_id: i64,
    pub creator_id: i64,
    pub creator_name: String,
    pub invited_player_id: i64,
    pub invited_player_name: String,
    pub status: String,
    pub session_duration_limit_minutes: i32,
    pub invitation_expiry_minutes: i32,
    pub invitation_expires_at: DateTime<Utc>,
    pub creator_session_id: Option<i64>,
    pub invited_session_id: Option<i64>,
    pub creator_score: Option<i32>,
    pub invited_score: Option<i32>,
    pub winner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Head-to-head tally over completed duels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeadToHead {
    pub player1_wins: i64,
    pub player2_wins: i64,
    pub draws: i64,
    pub total_duels: i64,
}

impl HeadToHead {
    pub fn tally(duels: &[Duel], player1_id: i64, player2_id: i64) -> Self {
        let mut h2h = Self::default();
        for duel in duels
            .iter()
            .filter(|d| d.status == DuelStatus::Completed.as_str())
        {
            h2h.total_duels += 1;
            match duel.winner_id {
                Some(id) if id == player1_id => h2h.player1_wins += 1,
                Some(id) if id == player2_id => h2h.player2_wins += 1,
                _ => h2h.draws += 1,
            }
        }
        h2h
    }
}

/// Columns needed to drive a transition
#[derive(Debug, FromRow)]
struct DuelState {
    creator_id: i64,
    invited_player_id: i64,
    status: String,
    session_duration_limit_minutes: i32,
    invitation_expires_at: DateTime<Utc>,
    creator_score: Option<i32>,
    invited_score: Option<i32>,
    creator_session_id: Option<i64>,
    invited_session_id: Option<i64>,
    created_at: DateTime<Utc>,
}

pub struct DuelRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> DuelRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a pending duel and notify the invited player.
    pub async fn create(
        &self,
        creator_id: i64,
        invited_player_id: i64,
        settings: DuelSettings,
    ) -> Result<Duel, DbError> {
        let mut tx = self.pool.begin().await?;

        let creator_name = name_of(&mut tx, creator_id).await?;
        name_of(&mut tx, invited_player_id).await?;

        let expires_at = Utc::now() + Duration::minutes(settings.invitation_expiry_minutes as i64);
        let (duel_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO duels (
                creator_id, invited_player_id, status, session_duration_limit_minutes,
                invitation_expiry_minutes, invitation_expires_at
            )
            VALUES ($1, $2, 'pending', $3, $4, $5)
            RETURNING duel_id
            "#,
        )
        .bind(creator_id)
        .bind(invited_player_id)
        .bind(settings.session_duration_limit_minutes)
        .bind(settings.invitation_expiry_minutes)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        notifications::insert(
            &mut tx,
            &NewNotification::duel_invite(invited_player_id, duel_id, &creator_name),
        )
        .await?;

        let duel = fetch(&mut tx, duel_id).await?;
        tx.commit().await?;

        tracing::info!(duel_id, creator_id, invited_player_id, "duel created");
        Ok(duel)
    }

    /// Mark pending duels past their invitation window as expired.
    pub async fn expire_stale(&self) -> Result<u64, DbError> {
        let result = sqlx::query(
            "UPDATE duels SET status = 'expired' \
             WHERE status = 'pending' AND invitation_expires_at <= NOW()",
        )
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            tracing::info!(expired = result.rows_affected(), "duel invitations expired");
        }
        Ok(result.rows_affected())
    }

    /// All duels the player is in, newest first.
    pub async fn list_for_player(&self, player_id: i64) -> Result<Vec<Duel>, DbError> {
        self.expire_stale().await?;

        let duels = sqlx::query_as::<_, Duel>(&format!(
            "{DUEL_SELECT} WHERE d.creator_id = $1 OR d.invited_player_id = $1 \
             ORDER BY d.created_at DESC, d.duel_id DESC"
        ))
        .bind(player_id)
        .fetch_all(self.pool)
        .await?;
        Ok(duels)
    }

    /// Duels between two players, newest first.
    pub async fn between(&self, player1_id: i64, player2_id: i64) -> Result<Vec<Duel>, DbError> {
        self.expire_stale().await?;

        let duels = sqlx::query_as::<_, Duel>(&format!(
            r#"{DUEL_SELECT}
            WHERE (d.creator_id = $1 AND d.invited_player_id = $2)
               OR (d.creator_id = $2 AND d.invited_player_id = $1)
            ORDER BY d.created_at DESC, d.duel_id DESC
            "#
        ))
        .bind(player1_id)
        .bind(player2_id)
        .fetch_all(self.pool)
        .await?;
        Ok(duels)
    }

    /// Accept or decline a pending invitation.
    pub async fn respond(
        &self,
        duel_id: i64,
        player_id: i64,
        response: DuelResponse,
    ) -> Result<Duel, DbError> {
        let mut tx = self.pool.begin().await?;
        let state = lock(&mut tx, duel_id).await?;

        if state.invited_player_id != player_id {
            return Err(DbError::Forbidden(
                "only the invited player can respond to this duel".into(),
            ));
        }
        if state.status != DuelStatus::Pending.as_str() {
            return Err(DbError::Conflict(format!("duel is already {}", state.status)));
        }
        if state.invitation_expires_at <= Utc::now() {
            set_status(&mut tx, duel_id, DuelStatus::Expired).await?;
            tx.commit().await?;
            return Err(DbError::Conflict("duel invitation has expired".into()));
        }

        let next = response.next_status();
        set_status(&mut tx, duel_id, next).await?;

        let responder_name = name_of(&mut tx, player_id).await?;
        notifications::insert(
            &mut tx,
            &NewNotification::duel_response(
                state.creator_id,
                duel_id,
                &responder_name,
                response == DuelResponse::Accept,
            ),
        )
        .await?;

        let duel = fetch(&mut tx, duel_id).await?;
        tx.commit().await?;

        tracing::info!(duel_id, status = next.as_str(), "duel response recorded");
        Ok(duel)
    }

    /// Submit a completed session to an active duel. The second submission
    /// decides the duel.
    pub async fn submit(
        &self,
        duel_id: i64,
        player_id: i64,
        session_id: i64,
    ) -> Result<Duel, DbError> {
        let mut tx = self.pool.begin().await?;
        let state = lock(&mut tx, duel_id).await?;

        let is_creator = if player_id == state.creator_id {
            true
        } else if player_id == state.invited_player_id {
            false
        } else {
            return Err(DbError::Forbidden("player is not part of this duel".into()));
        };

        if state.status != DuelStatus::Active.as_str() {
            return Err(DbError::Conflict(format!(
                "duel is {}, submissions need an active duel",
                state.status
            )));
        }
        let already = if is_creator {
            state.creator_session_id.is_some()
        } else {
            state.invited_session_id.is_some()
        };
        if already {
            return Err(DbError::Conflict("session already submitted for this duel".into()));
        }

        let session = sessions::completed_for(&mut tx, session_id, player_id).await?;
        if session.start_time < state.created_at {
            return Err(DbError::Rejected(
                "session was recorded before the duel was created".into(),
            ));
        }
        let limit_secs = state.session_duration_limit_minutes as f64 * 60.0;
        if session.session_duration > limit_secs {
            return Err(DbError::Rejected(format!(
                "session exceeds the duel limit of {} minutes",
                state.session_duration_limit_minutes
            )));
        }

        let score = session.total_makes;
        let sql = if is_creator {
            "UPDATE duels SET creator_session_id = $2, creator_score = $3 WHERE duel_id = $1"
        } else {
            "UPDATE duels SET invited_session_id = $2, invited_score = $3 WHERE duel_id = $1"
        };
        sqlx::query(sql)
            .bind(duel_id)
            .bind(session_id)
            .bind(score)
            .execute(&mut *tx)
            .await?;

        let (creator_score, invited_score) = if is_creator {
            (Some(score), state.invited_score)
        } else {
            (state.creator_score, Some(score))
        };

        if let (Some(creator_score), Some(invited_score)) = (creator_score, invited_score) {
            let outcome = DuelOutcome::decide(
                state.creator_id,
                creator_score,
                state.invited_player_id,
                invited_score,
            );
            sqlx::query(
                "UPDATE duels SET status = 'completed', winner_id = $2, completed_at = NOW() \
                 WHERE duel_id = $1",
            )
            .bind(duel_id)
            .bind(outcome.winner_id())
            .execute(&mut *tx)
            .await?;

            for participant in [state.creator_id, state.invited_player_id] {
                notifications::insert(
                    &mut tx,
                    &NewNotification::duel_complete(participant, duel_id, outcome.winner_id()),
                )
                .await?;
            }
            tracing::info!(duel_id, winner_id = ?outcome.winner_id(), "duel completed");
        }

        let duel = fetch(&mut tx, duel_id).await?;
        tx.commit().await?;
        Ok(duel)
    }
}

async fn fetch(conn: &mut PgConnection, duel_id: i64) -> Result<Duel, DbError> {
    sqlx::query_as::<_, Duel>(&format!("{DUEL_SELECT} WHERE d.duel_id = $1"))
        .bind(duel_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::not_found("duel", duel_id))
}

async fn lock(conn: &mut PgConnection, duel_id: i64) -> Result<DuelState, DbError> {
    sqlx::query_as::<_, DuelState>(
        r#"
        SELECT creator_id, invited_player_id, status, session_duration_limit_minutes,
               invitation_expires_at, creator_score, invited_score,
               creator_session_id, invited_session_id, created_at
        FROM duels
        WHERE duel_id = $1
        FOR UPDATE
        "#,
    )
    .bind(duel_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| DbError::not_found("duel", duel_id))
}

async fn set_status(conn: &mut PgConnection, duel_id: i64, status: DuelStatus) -> Result<(), DbError> {
    sqlx::query("UPDATE duels SET status = $2 WHERE duel_id = $1")
        .bind(duel_id)
        .bind(status.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

async fn name_of(conn: &mut PgConnection, player_id: i64) -> Result<String, DbError> {
    let (name,): (String,) = sqlx::query_as("SELECT name FROM players WHERE player_id = $1")
        .bind(player_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::not_found("player", player_id))?;
    Ok(name)
}
