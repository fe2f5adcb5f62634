//! Notification repository
//!
//! Producers (duels, leagues) insert through [`insert`] on their own
//! transaction so a notification exists only if the event committed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::{FromRow, PgConnection, PgPool};

use super::DbError;
use crate::models::{NewNotification, Window};

/// Notification record
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: i64,
    pub player_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub link_path: Option<String>,
    pub details: Option<Value>,
    pub read_status: bool,
    pub created_at: DateTime<Utc>,
}

pub struct NotificationRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Newest first.
    pub async fn list(&self, player_id: i64, window: Window) -> Result<Vec<Notification>, DbError> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, player_id, type, title, message, link_path, details, read_status, created_at
            FROM notifications
            WHERE player_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(player_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn unread_count(&self, player_id: i64) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE player_id = $1 AND NOT read_status",
        )
        .bind(player_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Mark one notification read. It must belong to `player_id`.
    pub async fn mark_read(&self, player_id: i64, notification_id: i64) -> Result<u64, DbError> {
        let result = sqlx::query(
            "UPDATE notifications SET read_status = TRUE WHERE id = $1 AND player_id = $2",
        )
        .bind(notification_id)
        .bind(player_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("notification", notification_id));
        }
        Ok(result.rows_affected())
    }

    /// Mark every unread notification of a player read.
    pub async fn mark_all_read(&self, player_id: i64) -> Result<u64, DbError> {
        let result = sqlx::query(
            "UPDATE notifications SET read_status = TRUE WHERE player_id = $1 AND NOT read_status",
        )
        .bind(player_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

pub(crate) async fn insert(conn: &mut PgConnection, n: &NewNotification) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO notifications (player_id, type, title, message, link_path, details)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(n.player_id)
    .bind(n.kind.as_str())
    .bind(&n.title)
    .bind(&n.message)
    .bind(&n.link_path)
    .bind(&n.details)
    .execute(conn)
    .await?;

    tracing::debug!(player_id = n.player_id, kind = n.kind.as_str(), "notification queued");
    Ok(())
}
