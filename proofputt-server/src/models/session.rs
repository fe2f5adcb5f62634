//! Putting session counters and derived rate metrics

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Putt counts keyed by category (e.g. "MAKE - TOP", "MISS - RETURN")
pub type CategoryCounts = BTreeMap<String, u32>;

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

/// Raw counters reported by the tracker for a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionCounts {
    pub makes: u32,
    pub misses: u32,
    pub best_streak: u32,
    pub fastest_21_makes: Option<f64>,
    pub most_makes_in_60_seconds: Option<u32>,
}

impl SessionCounts {
    /// Check counters against each other.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.total_putts() > i32::MAX as u64 {
            return Err(ValidationError::OutOfRange {
                field: "total_putts",
                reason: "exceeds the largest storable putt count",
            });
        }
        if self.best_streak > self.makes {
            return Err(ValidationError::OutOfRange {
                field: "best_streak",
                reason: "cannot exceed total_makes",
            });
        }
        if let Some(most) = self.most_makes_in_60_seconds {
            if most > self.makes {
                return Err(ValidationError::OutOfRange {
                    field: "most_makes_in_60_seconds",
                    reason: "cannot exceed total_makes",
                });
            }
        }
        if let Some(fastest) = self.fastest_21_makes {
            if !fastest.is_finite() || fastest <= 0.0 {
                return Err(ValidationError::OutOfRange {
                    field: "fastest_21_makes",
                    reason: "must be a positive number of seconds",
                });
            }
            if self.makes < 21 {
                return Err(ValidationError::OutOfRange {
                    field: "fastest_21_makes",
                    reason: "requires at least 21 makes",
                });
            }
        }
        Ok(())
    }

    pub fn total_putts(&self) -> u64 {
        u64::from(self.makes) + u64::from(self.misses)
    }
}

/// Aggregates derived from counts and duration
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionMetrics {
    pub total_putts: i32,
    pub total_makes: i32,
    pub total_misses: i32,
    pub make_percentage: f64,
    pub putts_per_minute: f64,
    pub makes_per_minute: f64,
    pub session_duration: f64,
}

impl SessionMetrics {
    /// Derive totals and per-minute rates. `total_putts` is always
    /// `makes + misses`; counts past `i32::MAX` are clamped so the two
    /// stay consistent.
    pub fn derive(makes: u32, misses: u32, duration_secs: f64) -> Self {
        let duration = if duration_secs.is_finite() && duration_secs > 0.0 {
            duration_secs
        } else {
            0.0
        };
        let makes = clamp_count(u64::from(makes));
        let misses = clamp_count(u64::from(misses)).min(i32::MAX - makes);
        let putts = makes + misses;
        let minutes = duration / 60.0;

        Self {
            total_putts: putts,
            total_makes: makes,
            total_misses: misses,
            make_percentage: percentage(makes as f64, putts as f64),
            putts_per_minute: safe_divide(putts as f64, minutes),
            makes_per_minute: safe_divide(makes as f64, minutes),
            session_duration: duration,
        }
    }
}

fn clamp_count(n: u64) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Division that yields 0 for a zero, negative or non-finite denominator.
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    let result = numerator / denominator;
    if result.is_finite() {
        result
    } else {
        0.0
    }
}

/// Make percentage rounded to one decimal place.
pub fn percentage(part: f64, whole: f64) -> f64 {
    (safe_divide(part, whole) * 1000.0).round() / 10.0
}
