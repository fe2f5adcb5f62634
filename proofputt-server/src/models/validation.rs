//! Validation error types

use std::fmt;

/// Validation error for request payloads and domain values
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Field is empty or absent when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// Field is shorter than its minimum length
    TooShort { field: &'static str, min: usize },

    /// String doesn't match required format (e.g., email)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },

    /// Numeric value outside its allowed range
    OutOfRange { field: &'static str, reason: &'static str },

    /// A field is required because of the value of another field
    RequiredWhen { field: &'static str, condition: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} is required", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::TooShort { field, min } => {
                write!(f, "{} must be at least {} characters", field, min)
            }
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
            Self::OutOfRange { field, reason } => write!(f, "{} {}", field, reason),
            Self::RequiredWhen { field, condition } => {
                write!(f, "{} required when {}", field, condition)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Parse an id from a path segment or query value.
///
/// Only ASCII digits are accepted and the value must be positive, so
/// `"12abc"`, `"-3"` and `"0"` are all rejected.
pub fn parse_id(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field,
            reason: "must be a positive integer",
        });
    }
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(ValidationError::OutOfRange {
            field,
            reason: "must be a positive integer",
        })
}

/// Check an id that arrived as a JSON number.
pub fn check_id(field: &'static str, id: i64) -> Result<i64, ValidationError> {
    if id <= 0 {
        return Err(ValidationError::OutOfRange {
            field,
            reason: "must be a positive integer",
        });
    }
    Ok(id)
}

/// Require an optional field.
pub fn required<T>(field: &'static str, value: Option<T>) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::Empty { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "name",
            max: 64,
        };
        assert_eq!(err.to_string(), "name exceeds maximum length of 64 characters");
    }

    #[test]
    fn ids_must_be_positive_digits() {
        assert_eq!(parse_id("player_id", "42").unwrap(), 42);
        assert!(matches!(
            parse_id("player_id", "abc"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(parse_id("player_id", "12abc").is_err());
        assert!(parse_id("player_id", "-3").is_err());
        assert!(parse_id("player_id", "0").is_err());
        assert!(parse_id("player_id", "").is_err());
        assert!(parse_id("player_id", "99999999999999999999").is_err());
        assert!(check_id("player_id", 0).is_err());
        assert_eq!(check_id("player_id", 5).unwrap(), 5);
    }

    #[test]
    fn required_when_reads_naturally() {
        let err = ValidationError::RequiredWhen {
            field: "ROI coordinates",
            condition: "is_calibrated is true",
        };
        assert_eq!(
            err.to_string(),
            "ROI coordinates required when is_calibrated is true"
        );
    }
}
