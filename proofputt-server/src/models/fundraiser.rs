//! Per-putt fundraising campaigns and pledges

use chrono::{DateTime, Utc};

use super::ValidationError;

const MAX_TITLE_LEN: usize = 200;

/// Campaign window. An open end means the campaign runs until closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampaignWindow {
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl CampaignWindow {
    pub fn new(
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        if let Some(end) = end_date {
            if end <= start_date {
                return Err(ValidationError::OutOfRange {
                    field: "end_date",
                    reason: "must be after start_date",
                });
            }
        }
        Ok(Self { start_date, end_date })
    }
}

pub fn validate_title(s: &str) -> Result<String, ValidationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ValidationError::Empty { field: "title" });
    }
    if s.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field: "title",
            max: MAX_TITLE_LEN,
        });
    }
    Ok(s.to_owned())
}

pub fn validate_charity_name(s: &str) -> Result<String, ValidationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ValidationError::Empty { field: "charity_name" });
    }
    Ok(s.to_owned())
}

/// A positive, finite amount.
pub fn validate_amount(field: &'static str, amount: f64) -> Result<f64, ValidationError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::OutOfRange {
            field,
            reason: "must be a positive amount",
        });
    }
    Ok(amount)
}

/// Amount a pledge owes for `putts_made`, capped at `max_amount`.
///
/// ```
/// use proofputt_server::models::fundraiser::accrued;
///
/// assert_eq!(accrued(0.5, Some(20.0), 30), 15.0);
/// assert_eq!(accrued(0.5, Some(20.0), 100), 20.0);
/// assert_eq!(accrued(0.5, None, 100), 50.0);
/// ```
pub fn accrued(amount_per_putt: f64, max_amount: Option<f64>, putts_made: i64) -> f64 {
    let raw = amount_per_putt * putts_made.max(0) as f64;
    match max_amount {
        Some(cap) => raw.min(cap),
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn window_must_be_ordered() {
        let start = Utc::now();
        assert!(CampaignWindow::new(start, Some(start + Duration::days(7))).is_ok());
        assert!(CampaignWindow::new(start, Some(start)).is_err());
        assert!(CampaignWindow::new(start, None).is_ok());
    }

    #[test]
    fn accrual_never_exceeds_cap() {
        for putts in [0, 1, 10, 1_000, 1_000_000] {
            let owed = accrued(0.25, Some(100.0), putts);
            assert!(owed <= 100.0);
            assert!(owed >= 0.0);
        }
    }

    #[test]
    fn amounts_positive() {
        assert!(validate_amount("amount_per_putt", 0.0).is_err());
        assert!(validate_amount("amount_per_putt", -1.0).is_err());
        assert!(validate_amount("amount_per_putt", f64::NAN).is_err());
        assert_eq!(validate_amount("amount_per_putt", 0.1).unwrap(), 0.1);
    }

    #[test]
    fn title_required() {
        assert!(validate_title("  ").is_err());
        assert_eq!(validate_title(" Putts for Pups ").unwrap(), "Putts for Pups");
    }
}
