//! Camera calibration endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::db::repos::{Calibration, CalibrationRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ValidId};
use crate::http::server::AppState;
use crate::models::CalibrationInput;

#[derive(Debug, Serialize)]
pub struct SavedCalibration {
    pub success: bool,
    pub message: &'static str,
    #[serde(flatten)]
    pub calibration: Calibration,
}

/// GET /api/player/{id}/calibration - stored row or the uncalibrated default
async fn get_calibration(
    State(state): State<Arc<AppState>>,
    ValidId(player_id): ValidId,
) -> Result<Json<Calibration>, ApiError> {
    let calibration = CalibrationRepo::new(&state.pool)
        .get(player_id)
        .await?
        .unwrap_or_else(|| Calibration::uncalibrated(player_id));
    Ok(Json(calibration))
}

/// POST|PUT /api/player/{id}/calibration - upsert
async fn save_calibration(
    State(state): State<Arc<AppState>>,
    ValidId(player_id): ValidId,
    ApiJson(input): ApiJson<CalibrationInput>,
) -> Result<Json<SavedCalibration>, ApiError> {
    let calibration = input.validate(Utc::now())?;
    let calibration = CalibrationRepo::new(&state.pool)
        .upsert(player_id, calibration)
        .await?;

    Ok(Json(SavedCalibration {
        success: true,
        message: "Calibration saved successfully",
        calibration,
    }))
}

/// Calibration routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/player/{id}/calibration",
        get(get_calibration)
            .post(save_calibration)
            .put(save_calibration),
    )
}
