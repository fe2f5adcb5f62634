//! Player repository
//!
//! - create: player + zeroed stats in one transaction
//! - aggregate: profile, stats, recent sessions and calibration from one
//!   read-only snapshot

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use super::calibrations::{self, Calibration};
use super::sessions::{self, Session};
use super::stats::{self, PlayerStats};
use super::DbError;
use crate::models::{Email, MembershipTier, NotificationPreferences, PlayerName, Timezone};

/// Sessions included in the aggregate payload
pub const AGGREGATE_SESSION_LIMIT: i64 = 25;

/// Results returned by player search
pub const SEARCH_LIMIT: i64 = 10;

const PLAYER_COLUMNS: &str = "player_id, email, name, membership_tier, subscription_status, \
     early_access_code, timezone, x_url, tiktok_url, website_url, created_at";

/// Player profile record
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Player {
    pub player_id: i64,
    pub email: String,
    pub name: String,
    pub membership_tier: String,
    pub subscription_status: String,
    pub early_access_code: Option<String>,
    pub timezone: String,
    pub x_url: Option<String>,
    pub tiktok_url: Option<String>,
    pub website_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Player {
    pub fn is_subscribed(&self) -> bool {
        self.subscription_status == crate::models::player::ACTIVE_SUBSCRIPTION
    }
}

/// Search hit
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlayerSummary {
    pub player_id: i64,
    pub name: String,
    pub email: String,
}

/// Registration data with the password already hashed
pub struct NewPlayer {
    pub email: Email,
    pub name: PlayerName,
    pub password_hash: String,
    pub tier: MembershipTier,
    pub early_access_code: Option<String>,
}

/// Profile fields to change; `None` leaves the column as is.
/// An empty link clears it.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub name: Option<PlayerName>,
    pub email: Option<Email>,
    pub timezone: Option<Timezone>,
    pub x_url: Option<String>,
    pub tiktok_url: Option<String>,
    pub website_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.timezone.is_none()
            && self.x_url.is_none()
            && self.tiktok_url.is_none()
            && self.website_url.is_none()
    }
}

/// Everything the dashboard needs about a player
#[derive(Debug, Clone)]
pub struct PlayerAggregate {
    pub player: Player,
    pub stats: Option<PlayerStats>,
    pub sessions: Vec<Session>,
    pub calibration: Option<Calibration>,
}

pub struct PlayerRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> PlayerRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a player and their zeroed stats row.
    pub async fn create(&self, new: NewPlayer) -> Result<Player, DbError> {
        let mut tx = self.pool.begin().await?;

        let player = sqlx::query_as::<_, Player>(&format!(
            r#"
            INSERT INTO players (
                email, name, password_hash, membership_tier, subscription_status, early_access_code
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PLAYER_COLUMNS}
            "#
        ))
        .bind(new.email.as_str())
        .bind(new.name.as_str())
        .bind(&new.password_hash)
        .bind(new.tier.as_str())
        .bind(new.tier.subscription_status())
        .bind(&new.early_access_code)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::Conflict(_) => {
                DbError::Conflict("an account with this email already exists".into())
            }
            other => other,
        })?;

        stats::init(&mut *tx, player.player_id).await?;

        tx.commit().await?;
        tracing::info!(player_id = player.player_id, tier = %player.membership_tier, "player registered");
        Ok(player)
    }

    pub async fn get(&self, player_id: i64) -> Result<Player, DbError> {
        sqlx::query_as::<_, Player>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE player_id = $1"
        ))
        .bind(player_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("player", player_id))
    }

    /// Player id and password hash for a login attempt.
    pub async fn credentials(&self, email: &Email) -> Result<Option<(i64, String)>, DbError> {
        let row = sqlx::query_as::<_, (i64, String)>(
            "SELECT player_id, password_hash FROM players WHERE lower(email) = $1",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Load the dashboard aggregate from one read-only snapshot.
    pub async fn aggregate(&self, player_id: i64) -> Result<PlayerAggregate, DbError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let player = sqlx::query_as::<_, Player>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE player_id = $1"
        ))
        .bind(player_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("player", player_id))?;

        let stats = stats::fetch(&mut *tx, player_id).await?;
        let sessions = sessions::recent(&mut *tx, player_id, AGGREGATE_SESSION_LIMIT).await?;
        let calibration = calibrations::fetch(&mut *tx, player_id).await?;

        tx.commit().await?;

        Ok(PlayerAggregate {
            player,
            stats,
            sessions,
            calibration,
        })
    }

    pub async fn update_profile(
        &self,
        player_id: i64,
        update: ProfileUpdate,
    ) -> Result<Player, DbError> {
        sqlx::query_as::<_, Player>(&format!(
            r#"
            UPDATE players SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                timezone = COALESCE($4, timezone),
                x_url = CASE WHEN $5::TEXT IS NULL THEN x_url ELSE NULLIF($5, '') END,
                tiktok_url = CASE WHEN $6::TEXT IS NULL THEN tiktok_url ELSE NULLIF($6, '') END,
                website_url = CASE WHEN $7::TEXT IS NULL THEN website_url ELSE NULLIF($7, '') END
            WHERE player_id = $1
            RETURNING {PLAYER_COLUMNS}
            "#
        ))
        .bind(player_id)
        .bind(update.name.as_ref().map(PlayerName::as_str))
        .bind(update.email.as_ref().map(Email::as_str))
        .bind(update.timezone.as_ref().map(Timezone::name))
        .bind(update.x_url)
        .bind(update.tiktok_url)
        .bind(update.website_url)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::Conflict(_) => {
                DbError::Conflict("an account with this email already exists".into())
            }
            other => other,
        })?
        .ok_or_else(|| DbError::not_found("player", player_id))
    }

    /// Stored notification preferences, or the defaults when unset.
    pub async fn preferences(&self, player_id: i64) -> Result<NotificationPreferences, DbError> {
        let (prefs,): (Option<Json<NotificationPreferences>>,) = sqlx::query_as(
            "SELECT notification_preferences FROM players WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("player", player_id))?;

        Ok(prefs.map(|Json(p)| p).unwrap_or_default())
    }

    pub async fn set_preferences(
        &self,
        player_id: i64,
        prefs: &NotificationPreferences,
    ) -> Result<(), DbError> {
        let result = sqlx::query(
            "UPDATE players SET notification_preferences = $2 WHERE player_id = $1",
        )
        .bind(player_id)
        .bind(Json(prefs))
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("player", player_id));
        }
        Ok(())
    }

    /// Change membership tier, recording the code that granted it.
    pub async fn set_tier(
        &self,
        player_id: i64,
        tier: MembershipTier,
        code: &str,
    ) -> Result<Player, DbError> {
        let player = sqlx::query_as::<_, Player>(&format!(
            r#"
            UPDATE players SET
                membership_tier = $2,
                subscription_status = $3,
                early_access_code = $4
            WHERE player_id = $1
            RETURNING {PLAYER_COLUMNS}
            "#
        ))
        .bind(player_id)
        .bind(tier.as_str())
        .bind(tier.subscription_status())
        .bind(code)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("player", player_id))?;

        tracing::info!(player_id, tier = tier.as_str(), "membership tier changed");
        Ok(player)
    }

    /// Case-insensitive substring search on name and email, excluding
    /// the searching player.
    pub async fn search(
        &self,
        term: &str,
        exclude_player_id: Option<i64>,
    ) -> Result<Vec<PlayerSummary>, DbError> {
        let rows = sqlx::query_as::<_, PlayerSummary>(
            r#"
            SELECT player_id, name, email
            FROM players
            WHERE (strpos(lower(name), lower($1)) > 0 OR strpos(lower(email), lower($1)) > 0)
              AND ($2::BIGINT IS NULL OR player_id <> $2)
            ORDER BY name ASC, player_id ASC
            LIMIT $3
            "#,
        )
        .bind(term)
        .bind(exclude_player_id)
        .bind(SEARCH_LIMIT)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Display name, used when composing notifications.
    pub async fn name_of(&self, player_id: i64) -> Result<String, DbError> {
        let (name,): (String,) = sqlx::query_as("SELECT name FROM players WHERE player_id = $1")
            .bind(player_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("player", player_id))?;
        Ok(name)
    }
}
