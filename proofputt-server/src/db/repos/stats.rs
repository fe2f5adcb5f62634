//! Career totals per player
//!
//! `player_stats` is derived from completed sessions and rewritten in the
//! same transaction that completes a session.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection};

use super::DbError;
use crate::models::session::percentage;

const STATS_COLUMNS: &str = "player_id, total_makes, total_misses, total_putts, best_streak, \
     fastest_21_makes, total_duration, sessions_played, last_updated";

/// Career stats row
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlayerStats {
    pub player_id: i64,
    pub total_makes: i32,
    pub total_misses: i32,
    pub total_putts: i32,
    pub best_streak: i32,
    pub fastest_21_makes: Option<f64>,
    pub total_duration: f64,
    pub sessions_played: i32,
    #[sqlx(skip)]
    pub make_percentage: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl PlayerStats {
    /// Zeroed stats for a player with no row.
    pub fn empty(player_id: i64) -> Self {
        Self {
            player_id,
            total_makes: 0,
            total_misses: 0,
            total_putts: 0,
            best_streak: 0,
            fastest_21_makes: None,
            total_duration: 0.0,
            sessions_played: 0,
            make_percentage: 0.0,
            last_updated: None,
        }
    }

    pub(crate) fn with_percentage(mut self) -> Self {
        self.make_percentage = percentage(self.total_makes as f64, self.total_putts as f64);
        self
    }
}

pub(crate) async fn fetch(
    conn: &mut PgConnection,
    player_id: i64,
) -> Result<Option<PlayerStats>, DbError> {
    let stats = sqlx::query_as::<_, PlayerStats>(&format!(
        "SELECT {STATS_COLUMNS} FROM player_stats WHERE player_id = $1"
    ))
    .bind(player_id)
    .fetch_optional(conn)
    .await?;

    Ok(stats.map(PlayerStats::with_percentage))
}

/// Insert the zeroed row for a new player.
pub(crate) async fn init(conn: &mut PgConnection, player_id: i64) -> Result<(), DbError> {
    sqlx::query("INSERT INTO player_stats (player_id) VALUES ($1) ON CONFLICT (player_id) DO NOTHING")
        .bind(player_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Recompute career totals from completed sessions.
pub(crate) async fn recompute(conn: &mut PgConnection, player_id: i64) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO player_stats (
            player_id, total_makes, total_misses, total_putts, best_streak,
            fastest_21_makes, total_duration, sessions_played, last_updated
        )
        SELECT
            $1,
            COALESCE(SUM(total_makes), 0)::INTEGER,
            COALESCE(SUM(total_misses), 0)::INTEGER,
            COALESCE(SUM(total_putts), 0)::INTEGER,
            COALESCE(MAX(best_streak), 0),
            MIN(fastest_21_makes),
            COALESCE(SUM(session_duration), 0),
            COUNT(*)::INTEGER,
            NOW()
        FROM sessions
        WHERE player_id = $1 AND status = 'completed'
        ON CONFLICT (player_id) DO UPDATE SET
            total_makes = EXCLUDED.total_makes,
            total_misses = EXCLUDED.total_misses,
            total_putts = EXCLUDED.total_putts,
            best_streak = EXCLUDED.best_streak,
            fastest_21_makes = EXCLUDED.fastest_21_makes,
            total_duration = EXCLUDED.total_duration,
            sessions_played = EXCLUDED.sessions_played,
            last_updated = NOW()
        "#,
    )
    .bind(player_id)
    .execute(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stats_are_zero() {
        let stats = PlayerStats::empty(3);
        assert_eq!(stats.total_putts, 0);
        assert_eq!(stats.make_percentage, 0.0);
        assert!(stats.fastest_21_makes.is_none());
    }

    #[test]
    fn percentage_is_derived() {
        let stats = PlayerStats {
            total_makes: 3,
            total_misses: 1,
            total_putts: 4,
            ..PlayerStats::empty(1)
        }
        .with_percentage();
        assert_eq!(stats.make_percentage, 75.0);
    }
}
