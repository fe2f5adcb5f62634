//! Camera calibration payloads

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::ValidationError;

pub const DEFAULT_QUALITY: &str = "unknown";
pub const DEFAULT_NOTES: &str = "Calibration updated";
pub const UNCALIBRATED_NOTES: &str =
    "No calibration found. Please connect desktop app and calibrate camera.";

/// Calibration fields as sent by the desktop app or web client.
/// Every field is optional; see [`CalibrationInput::validate`] for defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalibrationInput {
    pub is_calibrated: Option<bool>,
    pub calibration_date: Option<DateTime<Utc>>,
    pub camera_index: Option<i32>,
    pub roi_coordinates: Option<Value>,
    pub calibration_quality: Option<String>,
    pub notes: Option<String>,
    pub desktop_connected: Option<bool>,
}

/// Calibration ready to be upserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewCalibration {
    pub is_calibrated: bool,
    pub calibration_date: DateTime<Utc>,
    pub camera_index: i32,
    pub roi_coordinates: Option<Value>,
    pub calibration_quality: String,
    pub notes: String,
    pub desktop_connected: bool,
}

impl CalibrationInput {
    /// Apply defaults and check the ROI.
    ///
    /// A calibrated camera must carry ROI coordinates. When the ROI has
    /// numeric `width`/`height` keys they must be positive.
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewCalibration, ValidationError> {
        let is_calibrated = self.is_calibrated.unwrap_or(false);
        let roi = self.roi_coordinates.filter(|v| !v.is_null());

        if is_calibrated && roi.is_none() {
            return Err(ValidationError::RequiredWhen {
                field: "ROI coordinates",
                condition: "is_calibrated is true",
            });
        }
        if let Some(roi) = &roi {
            validate_roi(roi)?;
        }

        let camera_index = self.camera_index.unwrap_or(0);
        if camera_index < 0 {
            return Err(ValidationError::OutOfRange {
                field: "camera_index",
                reason: "must not be negative",
            });
        }

        Ok(NewCalibration {
            is_calibrated,
            calibration_date: self.calibration_date.unwrap_or(now),
            camera_index,
            roi_coordinates: roi,
            calibration_quality: non_blank(self.calibration_quality)
                .unwrap_or_else(|| DEFAULT_QUALITY.to_owned()),
            notes: non_blank(self.notes).unwrap_or_else(|| DEFAULT_NOTES.to_owned()),
            desktop_connected: self.desktop_connected.unwrap_or(false),
        })
    }
}

fn validate_roi(roi: &Value) -> Result<(), ValidationError> {
    let Some(obj) = roi.as_object() else {
        if roi.is_array() {
            return Ok(());
        }
        return Err(ValidationError::InvalidFormat {
            field: "roi_coordinates",
            reason: "must be an object or array",
        });
    };

    for key in ["width", "height"] {
        if let Some(v) = obj.get(key) {
            match v.as_f64() {
                Some(n) if n > 0.0 => {}
                _ => {
                    return Err(ValidationError::OutOfRange {
                        field: "roi_coordinates",
                        reason: "width and height must be positive",
                    })
                }
            }
        }
    }
    Ok(())
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}
