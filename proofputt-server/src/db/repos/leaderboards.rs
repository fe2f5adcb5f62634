//! Leaderboard queries
//!
//! Ranks come from `ROW_NUMBER()` with the player id as tie-breaker, so
//! rank strictly increases down each board.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};

use super::DbError;
use crate::models::leaderboard::LEADERBOARD_LIMIT;
use crate::models::SessionMetric;

/// One leaderboard row
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub player_id: i64,
    pub name: String,
    pub value: f64,
    /// Session that set the value, for per-session boards
    pub session_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Leaderboards {
    pub top_makes: Vec<LeaderboardEntry>,
    pub top_streaks: Vec<LeaderboardEntry>,
    pub top_makes_per_minute: Vec<LeaderboardEntry>,
    pub fastest_21: Vec<LeaderboardEntry>,
}

/// Which sessions count
#[derive(Debug, Clone, Copy)]
enum Scope {
    Global { since: Option<DateTime<Utc>> },
    League { league_id: i64 },
}

pub struct LeaderboardRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> LeaderboardRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Career makes plus per-session bests since `since` (all time when `None`).
    pub async fn global(&self, since: Option<DateTime<Utc>>) -> Result<Leaderboards, DbError> {
        let mut conn = self.pool.acquire().await?;

        let top_makes = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT
                ROW_NUMBER() OVER (ORDER BY ps.total_makes DESC, ps.player_id ASC) AS rank,
                ps.player_id,
                p.name,
                ps.total_makes::DOUBLE PRECISION AS value,
                NULL::BIGINT AS session_id
            FROM player_stats ps
            JOIN players p ON p.player_id = ps.player_id
            ORDER BY rank
            LIMIT $1
            "#,
        )
        .bind(LEADERBOARD_LIMIT)
        .fetch_all(&mut *conn)
        .await?;

        session_boards(&mut conn, Scope::Global { since }, top_makes).await
    }

    /// Boards over sessions submitted to the league's rounds. Makes are
    /// summed per player across rounds.
    pub async fn league(&self, league_id: i64) -> Result<Leaderboards, DbError> {
        let mut conn = self.pool.acquire().await?;

        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM leagues WHERE league_id = $1)")
                .bind(league_id)
                .fetch_one(&mut *conn)
                .await?;
        if !exists {
            return Err(DbError::not_found("league", league_id));
        }

        let top_makes = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            WITH totals AS (
                SELECT s.player_id, SUM(s.score)::BIGINT AS total
                FROM league_round_submissions s
                JOIN league_rounds r ON r.round_id = s.round_id
                WHERE r.league_id = $1
                GROUP BY s.player_id
            )
            SELECT
                ROW_NUMBER() OVER (ORDER BY t.total DESC, t.player_id ASC) AS rank,
                t.player_id,
                p.name,
                t.total::DOUBLE PRECISION AS value,
                NULL::BIGINT AS session_id
            FROM totals t
            JOIN players p ON p.player_id = t.player_id
            ORDER BY rank
            LIMIT $2
            "#,
        )
        .bind(league_id)
        .bind(LEADERBOARD_LIMIT)
        .fetch_all(&mut *conn)
        .await?;

        session_boards(&mut conn, Scope::League { league_id }, top_makes).await
    }
}

async fn session_boards(
    conn: &mut PgConnection,
    scope: Scope,
    top_makes: Vec<LeaderboardEntry>,
) -> Result<Leaderboards, DbError> {
    Ok(Leaderboards {
        top_makes,
        top_streaks: best_per_player(&mut *conn, SessionMetric::BestStreak, scope).await?,
        top_makes_per_minute: best_per_player(&mut *conn, SessionMetric::MakesPerMinute, scope)
            .await?,
        fastest_21: best_per_player(&mut *conn, SessionMetric::Fastest21, scope).await?,
    })
}

/// Each player's best completed session for `metric`, ranked.
async fn best_per_player(
    conn: &mut PgConnection,
    metric: SessionMetric,
    scope: Scope,
) -> Result<Vec<LeaderboardEntry>, DbError> {
    let column = metric.column();
    let direction = if metric.ascending() { "ASC" } else { "DESC" };

    let filter = match scope {
        Scope::Global { .. } => "($1::TIMESTAMPTZ IS NULL OR s.start_time >= $1)",
        Scope::League { .. } => {
            r#"s.session_id IN (
                SELECT sub.session_id
                FROM league_round_submissions sub
                JOIN league_rounds r ON r.round_id = sub.round_id
                WHERE r.league_id = $1
            )"#
        }
    };

    let sql = format!(
        r#"
        WITH best AS (
            SELECT DISTINCT ON (s.player_id)
                s.player_id,
                s.session_id,
                s.{column}::DOUBLE PRECISION AS value
            FROM sessions s
            WHERE s.status = 'completed'
              AND s.{column} IS NOT NULL
              AND s.{column} > 0
              AND {filter}
            ORDER BY s.player_id, s.{column} {direction}, s.session_id ASC
        )
        SELECT
            ROW_NUMBER() OVER (ORDER BY b.value {direction}, b.player_id ASC) AS rank,
            b.player_id,
            p.name,
            b.value,
            b.session_id
        FROM best b
        JOIN players p ON p.player_id = b.player_id
        ORDER BY rank
        LIMIT $2
        "#
    );

    let query = sqlx::query_as::<_, LeaderboardEntry>(&sql);
    let query = match scope {
        Scope::Global { since } => query.bind(since),
        Scope::League { league_id } => query.bind(league_id),
    };

    let rows = query.bind(LEADERBOARD_LIMIT).fetch_all(conn).await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_flat() {
        let entry = LeaderboardEntry {
            rank: 1,
            player_id: 7,
            name: "Pop".into(),
            value: 120.0,
            session_id: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["rank"], 1);
        assert_eq!(json["name"], "Pop");
        assert!(json["session_id"].is_null());
    }
}
