//! Desktop companion heartbeats

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use super::DbError;

#[derive(Debug, Clone, FromRow)]
pub struct Heartbeat {
    pub player_id: i64,
    pub desktop_version: Option<String>,
    pub capabilities: Option<Value>,
    pub last_ping: DateTime<Utc>,
}

/// Companion liveness as reported to the web client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesktopStatus {
    pub player_id: i64,
    pub connected: bool,
    pub status: &'static str,
    pub last_ping: Option<DateTime<Utc>>,
    pub desktop_version: Option<String>,
    pub capabilities: Option<Value>,
}

impl DesktopStatus {
    /// Connected when the last heartbeat is younger than `timeout`.
    pub fn evaluate(
        player_id: i64,
        heartbeat: Option<Heartbeat>,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Self {
        let timeout = chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::MAX);
        match heartbeat {
            Some(hb) => {
                let connected = now - hb.last_ping < timeout;
                Self {
                    player_id,
                    connected,
                    status: if connected { "active" } else { "disconnected" },
                    last_ping: Some(hb.last_ping),
                    desktop_version: hb.desktop_version,
                    capabilities: hb.capabilities,
                }
            }
            None => Self {
                player_id,
                connected: false,
                status: "disconnected",
                last_ping: None,
                desktop_version: None,
                capabilities: None,
            },
        }
    }
}

pub struct DesktopRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> DesktopRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a heartbeat. Version and capabilities are kept when omitted.
    pub async fn heartbeat(
        &self,
        player_id: i64,
        desktop_version: Option<String>,
        capabilities: Option<Value>,
    ) -> Result<Heartbeat, DbError> {
        let row = sqlx::query_as::<_, Heartbeat>(
            r#"
            INSERT INTO desktop_heartbeats (player_id, desktop_version, capabilities, last_ping)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (player_id) DO UPDATE SET
                desktop_version = COALESCE(EXCLUDED.desktop_version, desktop_heartbeats.desktop_version),
                capabilities = COALESCE(EXCLUDED.capabilities, desktop_heartbeats.capabilities),
                last_ping = NOW()
            RETURNING player_id, desktop_version, capabilities, last_ping
            "#,
        )
        .bind(player_id)
        .bind(desktop_version)
        .bind(capabilities)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from(e).or_missing("player", player_id))?;

        tracing::debug!(player_id, "desktop heartbeat");
        Ok(row)
    }

    pub async fn latest(&self, player_id: i64) -> Result<Option<Heartbeat>, DbError> {
        let row = sqlx::query_as::<_, Heartbeat>(
            "SELECT player_id, desktop_version, capabilities, last_ping \
             FROM desktop_heartbeats WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat(age_secs: i64, now: DateTime<Utc>) -> Heartbeat {
        Heartbeat {
            player_id: 1,
            desktop_version: Some("1.4.0".into()),
            capabilities: None,
            last_ping: now - chrono::Duration::seconds(age_secs),
        }
    }

    #[test]
    fn fresh_heartbeat_is_connected() {
        let now = Utc::now();
        let status = DesktopStatus::evaluate(1, Some(beat(10, now)), now, Duration::from_secs(60));
        assert!(status.connected);
        assert_eq!(status.status, "active");
        assert_eq!(status.desktop_version.as_deref(), Some("1.4.0"));
    }

    #[test]
    fn stale_heartbeat_is_disconnected() {
        let now = Utc::now();
        let status = DesktopStatus::evaluate(1, Some(beat(61, now)), now, Duration::from_secs(60));
        assert!(!status.connected);
        assert_eq!(status.status, "disconnected");
        assert!(status.last_ping.is_some());
    }

    #[test]
    fn no_heartbeat_is_disconnected() {
        let status = DesktopStatus::evaluate(1, None, Utc::now(), Duration::from_secs(60));
        assert!(!status.connected);
        assert!(status.last_ping.is_none());
    }

    #[test]
    fn same_inputs_same_answer() {
        let now = Utc::now();
        let a = DesktopStatus::evaluate(1, Some(beat(30, now)), now, Duration::from_secs(60));
        let b = DesktopStatus::evaluate(1, Some(beat(30, now)), now, Duration::from_secs(60));
        assert_eq!(a, b);
    }
}
