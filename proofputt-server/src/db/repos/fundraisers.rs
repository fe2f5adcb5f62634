//! Fundraiser and pledge repository
//!
//! Progress is computed on read from the creator's completed sessions
//! inside the campaign window.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;
use crate::models::fundraiser::accrued;
use crate::models::CampaignWindow;

const FUNDRAISER_SELECT: &str = r#"
    SELECT
        f.fundraiser_id,
        f.creator_id,
        p.name AS creator_name,
        f.title,
        f.description,
        f.charity_name,
        f.charity_wallet_address,
        f.target_amount,
        f.sat_per_putt,
        f.start_date,
        f.end_date,
        f.status,
        f.created_at
    FROM fundraisers f
    JOIN players p ON p.player_id = f.creator_id
"#;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Fundraiser {
    pub fundraiser_id: i64,
    pub creator_id: i64,
    pub creator_name: String,
    pub title: String,
    pub description: Option<String>,
    pub charity_name: String,
    pub charity_wallet_address: Option<String>,
    pub target_amount: Option<f64>,
    pub sat_per_putt: Option<i64>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Pledge {
    pub pledge_id: i64,
    pub fundraiser_id: i64,
    pub pledger_id: i64,
    pub pledger_name: String,
    pub amount_per_putt: f64,
    pub max_amount: Option<f64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub accrued: f64,
}

/// Fundraiser with pledges and progress
#[derive(Debug, Clone, Serialize)]
pub struct FundraiserDetail {
    #[serde(flatten)]
    pub fundraiser: Fundraiser,
    pub pledges: Vec<Pledge>,
    pub putts_made: i64,
    pub amount_raised: f64,
}

pub struct NewFundraiser {
    pub creator_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub charity_name: String,
    pub charity_wallet_address: Option<String>,
    pub target_amount: Option<f64>,
    pub sat_per_putt: Option<i64>,
    pub window: CampaignWindow,
}

pub struct FundraiserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> FundraiserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active fundraisers, newest first.
    pub async fn list_active(&self) -> Result<Vec<Fundraiser>, DbError> {
        let rows = sqlx::query_as::<_, Fundraiser>(&format!(
            "{FUNDRAISER_SELECT} WHERE f.status = 'active' \
             ORDER BY f.created_at DESC, f.fundraiser_id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(&self, new: NewFundraiser) -> Result<Fundraiser, DbError> {
        let (fundraiser_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO fundraisers (
                creator_id, title, description, charity_name, charity_wallet_address,
                target_amount, sat_per_putt, start_date, end_date, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'active')
            RETURNING fundraiser_id
            "#,
        )
        .bind(new.creator_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.charity_name)
        .bind(&new.charity_wallet_address)
        .bind(new.target_amount)
        .bind(new.sat_per_putt)
        .bind(new.window.start_date)
        .bind(new.window.end_date)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from(e).or_missing("player", new.creator_id))?;

        tracing::info!(fundraiser_id, creator_id = new.creator_id, "fundraiser created");
        self.get(fundraiser_id).await
    }

    pub async fn get(&self, fundraiser_id: i64) -> Result<Fundraiser, DbError> {
        sqlx::query_as::<_, Fundraiser>(&format!("{FUNDRAISER_SELECT} WHERE f.fundraiser_id = $1"))
            .bind(fundraiser_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("fundraiser", fundraiser_id))
    }

    /// Fundraiser with pledges and accrued amounts.
    pub async fn detail(&self, fundraiser_id: i64) -> Result<FundraiserDetail, DbError> {
        let fundraiser = self.get(fundraiser_id).await?;

        let (putts_made,): (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total_makes), 0)::BIGINT
            FROM sessions
            WHERE player_id = $1
              AND status = 'completed'
              AND start_time >= $2
              AND ($3::TIMESTAMPTZ IS NULL OR start_time < $3)
            "#,
        )
        .bind(fundraiser.creator_id)
        .bind(fundraiser.start_date)
        .bind(fundraiser.end_date)
        .fetch_one(self.pool)
        .await?;

        let mut pledges = sqlx::query_as::<_, Pledge>(
            r#"
            SELECT pl.pledge_id, pl.fundraiser_id, pl.pledger_id, p.name AS pledger_name,
                   pl.amount_per_putt, pl.max_amount, pl.status, pl.created_at
            FROM pledges pl
            JOIN players p ON p.player_id = pl.pledger_id
            WHERE pl.fundraiser_id = $1
            ORDER BY pl.created_at ASC, pl.pledge_id ASC
            "#,
        )
        .bind(fundraiser_id)
        .fetch_all(self.pool)
        .await?;

        for pledge in &mut pledges {
            pledge.accrued = accrued(pledge.amount_per_putt, pledge.max_amount, putts_made);
        }
        let amount_raised = pledges.iter().map(|p| p.accrued).sum();

        Ok(FundraiserDetail {
            fundraiser,
            pledges,
            putts_made,
            amount_raised,
        })
    }

    /// Pledge to an active fundraiser.
    pub async fn pledge(
        &self,
        fundraiser_id: i64,
        pledger_id: i64,
        amount_per_putt: f64,
        max_amount: Option<f64>,
    ) -> Result<Pledge, DbError> {
        let fundraiser = self.get(fundraiser_id).await?;
        if fundraiser.status != "active" {
            return Err(DbError::Conflict(format!(
                "fundraiser is {}; pledges need an active fundraiser",
                fundraiser.status
            )));
        }

        let pledge = sqlx::query_as::<_, Pledge>(
            r#"
            WITH inserted AS (
                INSERT INTO pledges (fundraiser_id, pledger_id, amount_per_putt, max_amount)
                VALUES ($1, $2, $3, $4)
                RETURNING pledge_id, fundraiser_id, pledger_id, amount_per_putt,
                          max_amount, status, created_at
            )
            SELECT i.pledge_id, i.fundraiser_id, i.pledger_id, p.name AS pledger_name,
                   i.amount_per_putt, i.max_amount, i.status, i.created_at
            FROM inserted i
            JOIN players p ON p.player_id = i.pledger_id
            "#,
        )
        .bind(fundraiser_id)
        .bind(pledger_id)
        .bind(amount_per_putt)
        .bind(max_amount)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from(e).or_missing("player", pledger_id))?;

        tracing::info!(fundraiser_id, pledger_id, amount_per_putt, "pledge recorded");
        Ok(pledge)
    }
}
