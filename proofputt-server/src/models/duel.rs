//! Duel lifecycle rules

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Default session length for a duel
pub const DEFAULT_SESSION_LIMIT_MINUTES: i32 = 15;

/// Default time an invitation stays open (72 hours)
pub const DEFAULT_INVITATION_EXPIRY_MINUTES: i32 = 72 * 60;

/// Duel status
///
/// `pending -> active -> completed`, or `pending -> declined | expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuelStatus {
    Pending,
    Active,
    Completed,
    Declined,
    Expired,
}

impl DuelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Declined => "declined",
            Self::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "declined" => Ok(Self::Declined),
            "expired" => Ok(Self::Expired),
            other => Err(ValidationError::InvalidVariant {
                field: "duel status",
                value: other.to_owned(),
            }),
        }
    }
}

/// Invited player's answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuelResponse {
    Accept,
    Decline,
}

impl DuelResponse {
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" | "accepted" => Ok(Self::Accept),
            "decline" | "declined" => Ok(Self::Decline),
            _ => Err(ValidationError::InvalidVariant {
                field: "response",
                value: s.to_owned(),
            }),
        }
    }

    /// Status the duel moves to.
    pub fn next_status(self) -> DuelStatus {
        match self {
            Self::Accept => DuelStatus::Active,
            Self::Decline => DuelStatus::Declined,
        }
    }
}

/// Duel settings as sent by clients
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DuelSettingsInput {
    pub session_duration_limit_minutes: Option<i32>,
    pub invitation_expiry_minutes: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DuelSettings {
    pub session_duration_limit_minutes: i32,
    pub invitation_expiry_minutes: i32,
}

impl Default for DuelSettings {
    fn default() -> Self {
        Self {
            session_duration_limit_minutes: DEFAULT_SESSION_LIMIT_MINUTES,
            invitation_expiry_minutes: DEFAULT_INVITATION_EXPIRY_MINUTES,
        }
    }
}

impl DuelSettingsInput {
    pub fn validate(self) -> Result<DuelSettings, ValidationError> {
        let defaults = DuelSettings::default();
        let settings = DuelSettings {
            session_duration_limit_minutes: self
                .session_duration_limit_minutes
                .unwrap_or(defaults.session_duration_limit_minutes),
            invitation_expiry_minutes: self
                .invitation_expiry_minutes
                .unwrap_or(defaults.invitation_expiry_minutes),
        };
        if settings.session_duration_limit_minutes <= 0 {
            return Err(ValidationError::OutOfRange {
                field: "session_duration_limit_minutes",
                reason: "must be positive",
            });
        }
        if settings.invitation_expiry_minutes <= 0 {
            return Err(ValidationError::OutOfRange {
                field: "invitation_expiry_minutes",
                reason: "must be positive",
            });
        }
        Ok(settings)
    }
}

/// Creator and invitee must differ.
pub fn ensure_distinct_players(creator_id: i64, invited_id: i64) -> Result<(), ValidationError> {
    if creator_id == invited_id {
        return Err(ValidationError::InvalidFormat {
            field: "invited_player_id",
            reason: "cannot challenge yourself",
        });
    }
    Ok(())
}

/// Final result of a duel with both scores in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuelOutcome {
    Winner(i64),
    Draw,
}

impl DuelOutcome {
    /// Higher score wins; equal scores are a draw.
    pub fn decide(creator_id: i64, creator_score: i32, invited_id: i64, invited_score: i32) -> Self {
        use std::cmp::Ordering;
        match creator_score.cmp(&invited_score) {
            Ordering::Greater => Self::Winner(creator_id),
            Ordering::Less => Self::Winner(invited_id),
            Ordering::Equal => Self::Draw,
        }
    }

    pub fn winner_id(&self) -> Option<i64> {
        match self {
            Self::Winner(id) => Some(*id),
            Self::Draw => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_synonyms() {
        assert_eq!(DuelResponse::parse("accept").unwrap(), DuelResponse::Accept);
        assert_eq!(DuelResponse::parse("Accepted").unwrap(), DuelResponse::Accept);
        assert_eq!(DuelResponse::parse("declined").unwrap(), DuelResponse::Decline);
        assert!(DuelResponse::parse("maybe").is_err());
    }

    #[test]
    fn response_transitions() {
        assert_eq!(DuelResponse::Accept.next_status(), DuelStatus::Active);
        assert_eq!(DuelResponse::Decline.next_status(), DuelStatus::Declined);
    }

    #[test]
    fn settings_defaults() {
        let s = DuelSettingsInput::default().validate().unwrap();
        assert_eq!(s.session_duration_limit_minutes, 15);
        assert_eq!(s.invitation_expiry_minutes, 4320);
    }

    #[test]
    fn settings_must_be_positive() {
        let input = DuelSettingsInput {
            session_duration_limit_minutes: Some(0),
            invitation_expiry_minutes: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn self_duel_rejected() {
        assert!(ensure_distinct_players(7, 7).is_err());
        assert!(ensure_distinct_players(7, 8).is_ok());
    }

    #[test]
    fn winner_is_participant_or_none() {
        for (a, b) in [(10, 3), (3, 10), (5, 5), (0, 0)] {
            let outcome = DuelOutcome::decide(1, a, 2, b);
            match outcome.winner_id() {
                Some(id) => assert!(id == 1 || id == 2),
                None => assert_eq!(a, b),
            }
        }
        assert_eq!(DuelOutcome::decide(1, 12, 2, 9), DuelOutcome::Winner(1));
        assert_eq!(DuelOutcome::decide(1, 12, 2, 12), DuelOutcome::Draw);
    }

    #[test]
    fn status_round_trip_names() {
        for s in ["pending", "active", "completed", "declined", "expired"] {
            assert_eq!(DuelStatus::parse(s).unwrap().as_str(), s);
        }
    }
}
