//! Calibration repository - one row per player, upserted

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::{FromRow, PgConnection, PgPool};

use super::DbError;
use crate::models::calibration::UNCALIBRATED_NOTES;
use crate::models::NewCalibration;

const CALIBRATION_COLUMNS: &str = "player_id, is_calibrated, calibration_date, camera_index, \
     roi_coordinates, calibration_quality, notes, desktop_connected, last_updated";

/// Calibration record
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Calibration {
    pub player_id: i64,
    pub is_calibrated: bool,
    pub calibration_date: Option<DateTime<Utc>>,
    pub camera_index: Option<i32>,
    pub roi_coordinates: Option<Value>,
    pub calibration_quality: Option<String>,
    pub notes: Option<String>,
    pub desktop_connected: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Calibration {
    /// Placeholder for a player who never calibrated.
    pub fn uncalibrated(player_id: i64) -> Self {
        Self {
            player_id,
            is_calibrated: false,
            calibration_date: None,
            camera_index: None,
            roi_coordinates: None,
            calibration_quality: None,
            notes: Some(UNCALIBRATED_NOTES.to_owned()),
            desktop_connected: false,
            last_updated: None,
        }
    }
}

pub struct CalibrationRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CalibrationRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, player_id: i64) -> Result<Option<Calibration>, DbError> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, player_id).await
    }

    /// Insert or replace the player's calibration. `last_updated` is
    /// always stamped by the database.
    pub async fn upsert(&self, player_id: i64, cal: NewCalibration) -> Result<Calibration, DbError> {
        let row = sqlx::query_as::<_, Calibration>(&format!(
            r#"
            INSERT INTO calibrations (
                player_id, is_calibrated, calibration_date, camera_index, roi_coordinates,
                calibration_quality, notes, desktop_connected, last_updated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (player_id) DO UPDATE SET
                is_calibrated = EXCLUDED.is_calibrated,
                calibration_date = EXCLUDED.calibration_date,
                camera_index = EXCLUDED.camera_index,
                roi_coordinates = EXCLUDED.roi_coordinates,
                calibration_quality = EXCLUDED.calibration_quality,
                notes = EXCLUDED.notes,
                desktop_connected = EXCLUDED.desktop_connected,
                last_updated = NOW()
            RETURNING {CALIBRATION_COLUMNS}
            "#
        ))
        .bind(player_id)
        .bind(cal.is_calibrated)
        .bind(cal.calibration_date)
        .bind(cal.camera_index)
        .bind(cal.roi_coordinates)
        .bind(cal.calibration_quality)
        .bind(cal.notes)
        .bind(cal.desktop_connected)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from(e).or_missing("player", player_id))?;

        tracing::info!(player_id, is_calibrated = row.is_calibrated, "calibration saved");
        Ok(row)
    }
}

pub(crate) async fn fetch(
    conn: &mut PgConnection,
    player_id: i64,
) -> Result<Option<Calibration>, DbError> {
    let row = sqlx::query_as::<_, Calibration>(&format!(
        "SELECT {CALIBRATION_COLUMNS} FROM calibrations WHERE player_id = $1"
    ))
    .bind(player_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_not_calibrated() {
        let cal = Calibration::uncalibrated(9);
        assert!(!cal.is_calibrated);
        assert!(cal.roi_coordinates.is_none());
        assert!(cal.notes.unwrap().starts_with("No calibration found"));
    }
}
