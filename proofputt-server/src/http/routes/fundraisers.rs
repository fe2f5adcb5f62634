//! Fundraiser and pledge endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::repos::{Fundraiser, FundraiserDetail, FundraiserRepo, NewFundraiser, Pledge};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ValidId};
use crate::http::server::AppState;
use crate::models::fundraiser::{validate_amount, validate_charity_name, validate_title};
use crate::models::{check_id, required, CampaignWindow, ValidationError};

#[derive(Debug, Serialize)]
pub struct FundraiserList {
    pub fundraisers: Vec<Fundraiser>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFundraiserRequest {
    pub creator_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub charity_name: Option<String>,
    pub charity_wallet_address: Option<String>,
    pub target_amount: Option<f64>,
    pub sat_per_putt: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl CreateFundraiserRequest {
    fn validate(self, now: DateTime<Utc>) -> Result<NewFundraiser, ValidationError> {
        let creator_id = check_id("creator_id", required("creator_id", self.creator_id)?)?;
        let title = validate_title(&required("title", self.title)?)?;
        let charity_name = validate_charity_name(&required("charity_name", self.charity_name)?)?;
        let target_amount = self
            .target_amount
            .map(|a| validate_amount("target_amount", a))
            .transpose()?;
        if self.sat_per_putt.is_some_and(|sats| sats <= 0) {
            return Err(ValidationError::OutOfRange {
                field: "sat_per_putt",
                reason: "must be positive",
            });
        }
        let window = CampaignWindow::new(self.start_date.unwrap_or(now), self.end_date)?;

        Ok(NewFundraiser {
            creator_id,
            title,
            description: self.description.map(|d| d.trim().to_owned()).filter(|d| !d.is_empty()),
            charity_name,
            charity_wallet_address: self
                .charity_wallet_address
                .map(|w| w.trim().to_owned())
                .filter(|w| !w.is_empty()),
            target_amount,
            sat_per_putt: self.sat_per_putt,
            window,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PledgeRequest {
    pub pledger_id: Option<i64>,
    pub amount_per_putt: Option<f64>,
    pub max_amount: Option<f64>,
}

/// GET /api/fundraisers - active campaigns, newest first
async fn list_fundraisers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FundraiserList>, ApiError> {
    let fundraisers = FundraiserRepo::new(&state.pool).list_active().await?;
    Ok(Json(FundraiserList { fundraisers }))
}

/// POST /api/fundraisers
async fn create_fundraiser(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateFundraiserRequest>,
) -> Result<(StatusCode, Json<Fundraiser>), ApiError> {
    let new = req.validate(Utc::now())?;
    let fundraiser = FundraiserRepo::new(&state.pool).create(new).await?;
    Ok((StatusCode::CREATED, Json(fundraiser)))
}

/// GET /api/fundraisers/{id} - detail with pledges and progress
async fn get_fundraiser(
    State(state): State<Arc<AppState>>,
    ValidId(fundraiser_id): ValidId,
) -> Result<Json<FundraiserDetail>, ApiError> {
    let detail = FundraiserRepo::new(&state.pool).detail(fundraiser_id).await?;
    Ok(Json(detail))
}

/// POST /api/fundraisers/{id}/pledge
async fn pledge(
    State(state): State<Arc<AppState>>,
    ValidId(fundraiser_id): ValidId,
    ApiJson(req): ApiJson<PledgeRequest>,
) -> Result<(StatusCode, Json<Pledge>), ApiError> {
    let pledger_id = check_id("pledger_id", required("pledger_id", req.pledger_id)?)?;
    let amount = validate_amount(
        "amount_per_putt",
        required("amount_per_putt", req.amount_per_putt)?,
    )?;
    let max_amount = req
        .max_amount
        .map(|cap| validate_amount("max_amount", cap))
        .transpose()?;

    let pledge = FundraiserRepo::new(&state.pool)
        .pledge(fundraiser_id, pledger_id, amount, max_amount)
        .await?;
    Ok((StatusCode::CREATED, Json(pledge)))
}

/// Fundraiser routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/fundraisers", get(list_fundraisers).post(create_fundraiser))
        .route("/api/fundraisers/{id}", get(get_fundraiser))
        .route("/api/fundraisers/{id}/pledge", post(pledge))
}
