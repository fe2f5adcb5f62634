//! League repository
//!
//! Round and league statuses follow the clock. There is no scheduler:
//! every read and write first runs [`advance`], which moves rounds to
//! `active`/`completed` and the league along with them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool};

use super::notifications;
use super::sessions;
use super::DbError;
use crate::models::league::schedule_rounds;
use crate::models::{
    LeagueSettings, LeagueSettingsInput, LeagueStatus, MemberStatus, NewNotification, PrivacyType,
    RoundStatus, RoundWindow,
};

const LEAGUE_SELECT: &str = r#"
    SELECT
        l.league_id,
        l.creator_id,
        c.name AS creator_name,
        l.name,
        l.description,
        l.privacy_type,
        l.status,
        l.settings,
        l.start_time,
        l.created_at,
        COALESCE(mc.member_count, 0) AS member_count
    FROM leagues l
    JOIN players c ON c.player_id = l.creator_id
    LEFT JOIN (
        SELECT league_id, COUNT(*) AS member_count
        FROM league_members
        WHERE status = 'active'
        GROUP BY league_id
    ) mc ON mc.league_id = l.league_id
"#;

/// League with creator name and active member count
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct League {
    pub league_id: i64,
    pub creator_id: i64,
    pub creator_name: String,
    pub name: String,
    pub description: Option<String>,
    pub privacy_type: String,
    pub status: String,
    pub settings: Json<LeagueSettings>,
    pub start_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub member_count: i64,
}

/// Round with submission counts; `has_submitted` is relative to the
/// player the rounds were loaded for.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeagueRound {
    pub round_id: i64,
    pub league_id: i64,
    pub round_number: i32,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub submission_count: i64,
    pub has_submitted: bool,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeagueMember {
    pub player_id: i64,
    pub name: String,
    pub status: String,
    pub invited_by: Option<i64>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RoundSubmission {
    pub submission_id: i64,
    pub round_id: i64,
    pub player_id: i64,
    pub player_name: String,
    pub session_id: i64,
    pub score: i32,
    pub points_awarded: Option<i32>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundWithSubmissions {
    #[serde(flatten)]
    pub round: LeagueRound,
    pub submissions: Vec<RoundSubmission>,
}

/// Full league view
#[derive(Debug, Clone, Serialize)]
pub struct LeagueDetail {
    #[serde(flatten)]
    pub league: League,
    pub members: Vec<LeagueMember>,
    pub rounds: Vec<RoundWithSubmissions>,
}

/// League in a player's list, with their view of its rounds
#[derive(Debug, Clone, Serialize)]
pub struct LeagueSummary {
    #[serde(flatten)]
    pub league: League,
    pub rounds: Vec<LeagueRound>,
}

/// Leagues page for one player
#[derive(Debug, Clone, Serialize)]
pub struct PlayerLeagues {
    pub my_leagues: Vec<LeagueSummary>,
    pub public_leagues: Vec<League>,
    pub pending_invites: Vec<League>,
}

pub struct NewLeague {
    pub creator_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub privacy_type: PrivacyType,
    pub settings: LeagueSettings,
    pub start_time: DateTime<Utc>,
}

/// Creator edits; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct LeagueEdit {
    pub name: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub privacy_type: Option<PrivacyType>,
    pub settings: Option<LeagueSettingsInput>,
    pub start_time: Option<DateTime<Utc>>,
}

/// Locked league row
#[derive(Debug, FromRow)]
struct LeagueState {
    creator_id: i64,
    name: String,
    privacy_type: String,
    status: String,
    settings: Json<LeagueSettings>,
    start_time: DateTime<Utc>,
}

pub struct LeagueRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> LeagueRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a league in `registering`, add the creator and schedule
    /// its rounds.
    pub async fn create(&self, new: NewLeague) -> Result<LeagueDetail, DbError> {
        let mut tx = self.pool.begin().await?;

        let (league_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO leagues (creator_id, name, description, privacy_type, status, settings, start_time)
            VALUES ($1, $2, $3, $4, 'registering', $5, $6)
            RETURNING league_id
            "#,
        )
        .bind(new.creator_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.privacy_type.as_str())
        .bind(Json(new.settings))
        .bind(new.start_time)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).or_missing("player", new.creator_id))?;

        sqlx::query(
            "INSERT INTO league_members (league_id, player_id, status) VALUES ($1, $2, 'active')",
        )
        .bind(league_id)
        .bind(new.creator_id)
        .execute(&mut *tx)
        .await?;

        insert_rounds(&mut tx, league_id, &schedule_rounds(new.start_time, &new.settings)).await?;
        advance(&mut tx).await?;

        let detail = load_detail(&mut tx, league_id).await?;
        tx.commit().await?;

        tracing::info!(
            league_id,
            creator_id = new.creator_id,
            rounds = new.settings.num_rounds,
            "league created"
        );
        Ok(detail)
    }

    pub async fn detail(&self, league_id: i64) -> Result<LeagueDetail, DbError> {
        let mut tx = self.pool.begin().await?;
        advance(&mut tx).await?;
        let detail = load_detail(&mut tx, league_id).await?;
        tx.commit().await?;
        Ok(detail)
    }

    /// The player's leagues, joinable public leagues, and open invitations.
    pub async fn list_for_player(&self, player_id: i64) -> Result<PlayerLeagues, DbError> {
        let mut tx = self.pool.begin().await?;
        advance(&mut tx).await?;

        let mine = sqlx::query_as::<_, League>(&format!(
            r#"{LEAGUE_SELECT}
            JOIN league_members m
              ON m.league_id = l.league_id AND m.player_id = $1 AND m.status = 'active'
            ORDER BY l.start_time DESC, l.league_id DESC
            "#
        ))
        .bind(player_id)
        .fetch_all(&mut *tx)
        .await?;

        let public_leagues = sqlx::query_as::<_, League>(&format!(
            r#"{LEAGUE_SELECT}
            WHERE l.privacy_type = 'public'
              AND l.status <> 'completed'
              AND NOT EXISTS (
                  SELECT 1 FROM league_members m
                  WHERE m.league_id = l.league_id AND m.player_id = $1
              )
            ORDER BY l.start_time ASC, l.league_id ASC
            "#
        ))
        .bind(player_id)
        .fetch_all(&mut *tx)
        .await?;

        let pending_invites = sqlx::query_as::<_, League>(&format!(
            r#"{LEAGUE_SELECT}
            JOIN league_members m
              ON m.league_id = l.league_id AND m.player_id = $1 AND m.status = 'invited'
            ORDER BY m.joined_at DESC
            "#
        ))
        .bind(player_id)
        .fetch_all(&mut *tx)
        .await?;

        let ids: Vec<i64> = mine.iter().map(|l| l.league_id).collect();
        let mut rounds_by_league: HashMap<i64, Vec<LeagueRound>> = HashMap::new();
        for round in load_rounds(&mut tx, &ids, Some(player_id)).await? {
            rounds_by_league.entry(round.league_id).or_default().push(round);
        }

        tx.commit().await?;

        let my_leagues = mine
            .into_iter()
            .map(|league| LeagueSummary {
                rounds: rounds_by_league.remove(&league.league_id).unwrap_or_default(),
                league,
            })
            .collect();

        Ok(PlayerLeagues {
            my_leagues,
            public_leagues,
            pending_invites,
        })
    }

    /// Creator-only edit while registering. New settings or start time
    /// reschedule the rounds.
    pub async fn update(
        &self,
        league_id: i64,
        editor_id: i64,
        edit: LeagueEdit,
    ) -> Result<LeagueDetail, DbError> {
        let mut tx = self.pool.begin().await?;
        advance(&mut tx).await?;
        let state = lock(&mut tx, league_id).await?;

        if state.creator_id != editor_id {
            return Err(DbError::Forbidden("only the league creator can edit it".into()));
        }
        if state.status != LeagueStatus::Registering.as_str() {
            return Err(DbError::Conflict(format!(
                "league is {}; only registering leagues can be edited",
                state.status
            )));
        }

        let Json(current) = state.settings;
        let settings = match edit.settings {
            Some(input) => input
                .apply(current)
                .map_err(|e| DbError::Rejected(e.to_string()))?,
            None => current,
        };
        let start_time = edit.start_time.unwrap_or(state.start_time);
        let reschedule = settings != current || start_time != state.start_time;

        sqlx::query(
            r#"
            UPDATE leagues SET
                name = COALESCE($2, name),
                description = CASE WHEN $7 THEN $3 ELSE description END,
                privacy_type = COALESCE($4, privacy_type),
                settings = $5,
                start_time = $6
            WHERE league_id = $1
            "#,
        )
        .bind(league_id)
        .bind(&edit.name)
        .bind(edit.description.as_ref().and_then(|d| d.as_deref()))
        .bind(edit.privacy_type.map(|p| p.as_str()))
        .bind(Json(settings))
        .bind(start_time)
        .bind(edit.description.is_some())
        .execute(&mut *tx)
        .await?;

        if reschedule {
            sqlx::query("DELETE FROM league_rounds WHERE league_id = $1")
                .bind(league_id)
                .execute(&mut *tx)
                .await?;
            insert_rounds(&mut tx, league_id, &schedule_rounds(start_time, &settings)).await?;
            advance(&mut tx).await?;
        }

        let detail = load_detail(&mut tx, league_id).await?;
        tx.commit().await?;

        tracing::info!(league_id, reschedule, "league updated");
        Ok(detail)
    }

    /// Creator-only delete while registering. Members, rounds and
    /// submissions cascade.
    pub async fn delete(&self, league_id: i64, player_id: i64) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        advance(&mut tx).await?;
        let state = lock(&mut tx, league_id).await?;

        if state.creator_id != player_id {
            return Err(DbError::Forbidden("only the league creator can delete it".into()));
        }
        if state.status != LeagueStatus::Registering.as_str() {
            return Err(DbError::Conflict(format!(
                "league is {}; only registering leagues can be deleted",
                state.status
            )));
        }

        sqlx::query("DELETE FROM leagues WHERE league_id = $1")
            .bind(league_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(league_id, "league deleted");
        Ok(())
    }

    /// Join a public league, or accept an invitation to a private one.
    pub async fn join(&self, league_id: i64, player_id: i64) -> Result<League, DbError> {
        let mut tx = self.pool.begin().await?;
        advance(&mut tx).await?;
        let state = lock(&mut tx, league_id).await?;

        if state.status == LeagueStatus::Completed.as_str() {
            return Err(DbError::Conflict("league has already finished".into()));
        }

        let membership: Option<(String,)> = sqlx::query_as(
            "SELECT status FROM league_members WHERE league_id = $1 AND player_id = $2",
        )
        .bind(league_id)
        .bind(player_id)
        .fetch_optional(&mut *tx)
        .await?;

        match membership {
            Some((status,)) if status == MemberStatus::Active.as_str() => {
                return Err(DbError::Conflict("already a member of this league".into()));
            }
            Some(_) => {
                sqlx::query(
                    "UPDATE league_members SET status = 'active', joined_at = NOW() \
                     WHERE league_id = $1 AND player_id = $2",
                )
                .bind(league_id)
                .bind(player_id)
                .execute(&mut *tx)
                .await?;
            }
            None if state.privacy_type == PrivacyType::Public.as_str() => {
                sqlx::query(
                    "INSERT INTO league_members (league_id, player_id, status) VALUES ($1, $2, 'active')",
                )
                .bind(league_id)
                .bind(player_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::from(e).or_missing("player", player_id))?;
            }
            None => {
                return Err(DbError::Forbidden(
                    "this league is private; an invitation is required".into(),
                ));
            }
        }

        let league = fetch_league(&mut tx, league_id).await?;
        tx.commit().await?;

        tracing::info!(league_id, player_id, "player joined league");
        Ok(league)
    }

    /// Leave a league. The creator cannot leave.
    pub async fn leave(&self, league_id: i64, player_id: i64) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        let state = lock(&mut tx, league_id).await?;

        if state.creator_id == player_id {
            return Err(DbError::Conflict("the league creator cannot leave".into()));
        }

        let result = sqlx::query("DELETE FROM league_members WHERE league_id = $1 AND player_id = $2")
            .bind(league_id)
            .bind(player_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("league member", player_id));
        }

        tx.commit().await?;
        tracing::info!(league_id, player_id, "player left league");
        Ok(())
    }

    /// Invite a player. The creator may always invite; other active
    /// members only when the league allows player invites.
    pub async fn invite(
        &self,
        league_id: i64,
        inviter_id: i64,
        invitee_id: i64,
    ) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        advance(&mut tx).await?;
        let state = lock(&mut tx, league_id).await?;

        if state.status == LeagueStatus::Completed.as_str() {
            return Err(DbError::Conflict("league has already finished".into()));
        }

        if state.creator_id != inviter_id {
            let inviter_active = is_active_member(&mut tx, league_id, inviter_id).await?;
            if !(inviter_active && state.settings.allow_player_invites) {
                return Err(DbError::Forbidden(
                    "only the creator can invite players to this league".into(),
                ));
            }
        }

        let (inviter_name,): (String,) =
            sqlx::query_as("SELECT name FROM players WHERE player_id = $1")
                .bind(inviter_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("player", inviter_id))?;

        let result = sqlx::query(
            r#"
            INSERT INTO league_members (league_id, player_id, status, invited_by)
            VALUES ($1, $2, 'invited', $3)
            ON CONFLICT (league_id, player_id) DO NOTHING
            "#,
        )
        .bind(league_id)
        .bind(invitee_id)
        .bind(inviter_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).or_missing("player", invitee_id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::Conflict(
                "player is already a member of or invited to this league".into(),
            ));
        }

        notifications::insert(
            &mut tx,
            &NewNotification::league_invite(invitee_id, league_id, &state.name, &inviter_name),
        )
        .await?;

        tx.commit().await?;
        tracing::info!(league_id, inviter_id, invitee_id, "league invitation sent");
        Ok(())
    }

    /// Submit a completed session to an active round.
    pub async fn submit_round(
        &self,
        league_id: i64,
        round_id: i64,
        player_id: i64,
        session_id: i64,
    ) -> Result<RoundSubmission, DbError> {
        let mut tx = self.pool.begin().await?;
        advance(&mut tx).await?;

        let round: Option<(String, DateTime<Utc>, DateTime<Utc>, Json<LeagueSettings>)> =
            sqlx::query_as(
                r#"
                SELECT r.status, r.start_time, r.end_time, l.settings
                FROM league_rounds r
                JOIN leagues l ON l.league_id = r.league_id
                WHERE r.round_id = $1 AND r.league_id = $2
                FOR UPDATE OF r
                "#,
            )
            .bind(round_id)
            .bind(league_id)
            .fetch_optional(&mut *tx)
            .await?;

        let (status, start, end, Json(settings)) =
            round.ok_or_else(|| DbError::not_found("league round", round_id))?;

        if status != RoundStatus::Active.as_str() {
            return Err(DbError::Conflict(format!(
                "round is {status}; submissions need an active round"
            )));
        }
        if !is_active_member(&mut tx, league_id, player_id).await? {
            return Err(DbError::Forbidden("player is not an active member of this league".into()));
        }

        let session = sessions::completed_for(&mut tx, session_id, player_id).await?;
        if session.start_time < start || session.start_time >= end {
            return Err(DbError::Rejected("session was not played during this round".into()));
        }
        if session.session_duration > settings.time_limit_minutes as f64 * 60.0 {
            return Err(DbError::Rejected(format!(
                "session exceeds the league time limit of {} minutes",
                settings.time_limit_minutes
            )));
        }

        let submission = sqlx::query_as::<_, RoundSubmission>(
            r#"
            WITH inserted AS (
                INSERT INTO league_round_submissions (round_id, player_id, session_id, score)
                VALUES ($1, $2, $3, $4)
                RETURNING submission_id, round_id, player_id, session_id, score,
                          points_awarded, submitted_at
            )
            SELECT i.submission_id, i.round_id, i.player_id, p.name AS player_name,
                   i.session_id, i.score, i.points_awarded, i.submitted_at
            FROM inserted i
            JOIN players p ON p.player_id = i.player_id
            "#,
        )
        .bind(round_id)
        .bind(player_id)
        .bind(session_id)
        .bind(session.total_makes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::Conflict(_) => {
                DbError::Conflict("a session was already submitted for this round".into())
            }
            other => other,
        })?;

        tx.commit().await?;
        tracing::info!(league_id, round_id, player_id, score = submission.score, "round submission");
        Ok(submission)
    }
}

/// Move rounds and leagues to the status the clock says they are in.
pub(crate) async fn advance(conn: &mut PgConnection) -> Result<(), DbError> {
    let rounds = sqlx::query(
        r#"
        UPDATE league_rounds SET status = next.status
        FROM (
            SELECT round_id,
                   CASE WHEN end_time <= NOW() THEN 'completed'
                        WHEN start_time <= NOW() THEN 'active'
                        ELSE 'scheduled' END AS status
            FROM league_rounds
        ) next
        WHERE league_rounds.round_id = next.round_id
          AND league_rounds.status <> next.status
        "#,
    )
    .execute(&mut *conn)
    .await?;

    let leagues = sqlx::query(
        r#"
        UPDATE leagues SET status = next.status
        FROM (
            SELECT league_id,
                   CASE WHEN bool_and(status = 'completed') THEN 'completed'
                        WHEN bool_or(status IN ('active', 'completed')) THEN 'active'
                        ELSE 'registering' END AS status
            FROM league_rounds
            GROUP BY league_id
        ) next
        WHERE leagues.league_id = next.league_id
          AND leagues.status <> next.status
        "#,
    )
    .execute(&mut *conn)
    .await?;

    if rounds.rows_affected() > 0 || leagues.rows_affected() > 0 {
        tracing::debug!(
            rounds = rounds.rows_affected(),
            leagues = leagues.rows_affected(),
            "league statuses advanced"
        );
    }
    Ok(())
}

async fn insert_rounds(
    conn: &mut PgConnection,
    league_id: i64,
    rounds: &[RoundWindow],
) -> Result<(), DbError> {
    let now = Utc::now();
    let numbers: Vec<i32> = rounds.iter().map(|r| r.round_number).collect();
    let statuses: Vec<&str> = rounds
        .iter()
        .map(|r| RoundStatus::at(r.start_time, r.end_time, now).as_str())
        .collect();
    let starts: Vec<DateTime<Utc>> = rounds.iter().map(|r| r.start_time).collect();
    let ends: Vec<DateTime<Utc>> = rounds.iter().map(|r| r.end_time).collect();

    sqlx::query(
        r#"
        INSERT INTO league_rounds (league_id, round_number, status, start_time, end_time)
        SELECT $1, r.round_number, r.status, r.start_time, r.end_time
        FROM UNNEST($2::INTEGER[], $3::TEXT[], $4::TIMESTAMPTZ[], $5::TIMESTAMPTZ[])
            AS r(round_number, status, start_time, end_time)
        "#,
    )
    .bind(league_id)
    .bind(&numbers)
    .bind(&statuses)
    .bind(&starts)
    .bind(&ends)
    .execute(conn)
    .await?;
    Ok(())
}

async fn lock(conn: &mut PgConnection, league_id: i64) -> Result<LeagueState, DbError> {
    sqlx::query_as::<_, LeagueState>(
        r#"
        SELECT creator_id, name, privacy_type, status, settings, start_time
        FROM leagues
        WHERE league_id = $1
        FOR UPDATE
        "#,
    )
    .bind(league_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| DbError::not_found("league", league_id))
}

async fn is_active_member(
    conn: &mut PgConnection,
    league_id: i64,
    player_id: i64,
) -> Result<bool, DbError> {
    let (active,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM league_members
            WHERE league_id = $1 AND player_id = $2 AND status = 'active'
        )
        "#,
    )
    .bind(league_id)
    .bind(player_id)
    .fetch_one(conn)
    .await?;
    Ok(active)
}

async fn fetch_league(conn: &mut PgConnection, league_id: i64) -> Result<League, DbError> {
    sqlx::query_as::<_, League>(&format!("{LEAGUE_SELECT} WHERE l.league_id = $1"))
        .bind(league_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::not_found("league", league_id))
}

async fn load_rounds(
    conn: &mut PgConnection,
    league_ids: &[i64],
    player_id: Option<i64>,
) -> Result<Vec<LeagueRound>, DbError> {
    let rounds = sqlx::query_as::<_, LeagueRound>(
        r#"
        SELECT
            r.round_id,
            r.league_id,
            r.round_number,
            r.status,
            r.start_time,
            r.end_time,
            COUNT(s.submission_id) AS submission_count,
            COALESCE(bool_or(s.player_id = $2), FALSE) AS has_submitted
        FROM league_rounds r
        LEFT JOIN league_round_submissions s ON s.round_id = r.round_id
        WHERE r.league_id = ANY($1)
        GROUP BY r.round_id
        ORDER BY r.league_id, r.round_number
        "#,
    )
    .bind(league_ids)
    .bind(player_id)
    .fetch_all(conn)
    .await?;
    Ok(rounds)
}

async fn load_detail(conn: &mut PgConnection, league_id: i64) -> Result<LeagueDetail, DbError> {
    let league = fetch_league(&mut *conn, league_id).await?;

    let members = sqlx::query_as::<_, LeagueMember>(
        r#"
        SELECT m.player_id, p.name, m.status, m.invited_by, m.joined_at
        FROM league_members m
        JOIN players p ON p.player_id = m.player_id
        WHERE m.league_id = $1
        ORDER BY m.joined_at ASC, m.player_id ASC
        "#,
    )
    .bind(league_id)
    .fetch_all(&mut *conn)
    .await?;

    let submissions = sqlx::query_as::<_, RoundSubmission>(
        r#"
        SELECT s.submission_id, s.round_id, s.player_id, p.name AS player_name,
               s.session_id, s.score, s.points_awarded, s.submitted_at
        FROM league_round_submissions s
        JOIN league_rounds r ON r.round_id = s.round_id
        JOIN players p ON p.player_id = s.player_id
        WHERE r.league_id = $1
        ORDER BY s.score DESC, s.submitted_at ASC
        "#,
    )
    .bind(league_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_round: HashMap<i64, Vec<RoundSubmission>> = HashMap::new();
    for submission in submissions {
        by_round.entry(submission.round_id).or_default().push(submission);
    }

    let rounds = load_rounds(&mut *conn, &[league_id], None)
        .await?
        .into_iter()
        .map(|round| RoundWithSubmissions {
            submissions: by_round.remove(&round.round_id).unwrap_or_default(),
            round,
        })
        .collect();

    Ok(LeagueDetail {
        league,
        members,
        rounds,
    })
}
