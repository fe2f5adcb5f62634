//! Leaderboard query parameters

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::ValidationError;

/// Entries per board
pub const LEADERBOARD_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Weekly,
    Monthly,
    AllTime,
}

impl Timeframe {
    pub fn parse(s: Option<&str>) -> Result<Self, ValidationError> {
        match s.map(str::trim) {
            None | Some("") | Some("weekly") => Ok(Self::Weekly),
            Some("monthly") => Ok(Self::Monthly),
            Some("all_time") | Some("alltime") => Ok(Self::AllTime),
            Some(other) => Err(ValidationError::InvalidVariant {
                field: "timeframe",
                value: other.to_owned(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::AllTime => "all_time",
        }
    }

    /// Earliest session start counted, or `None` for all time.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Weekly => Some(now - Duration::days(7)),
            Self::Monthly => Some(now - Duration::days(30)),
            Self::AllTime => None,
        }
    }
}

/// Leaderboard scope. Only the global board is served at the top level;
/// league boards have their own route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardType {
    Global,
}

impl LeaderboardType {
    pub fn parse(s: Option<&str>) -> Result<Self, ValidationError> {
        match s.map(str::trim) {
            None | Some("") | Some("global") => Ok(Self::Global),
            Some(other) => Err(ValidationError::InvalidVariant {
                field: "type",
                value: other.to_owned(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
        }
    }
}

/// Per-session metric ranked on a board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMetric {
    BestStreak,
    MakesPerMinute,
    Fastest21,
}

impl SessionMetric {
    /// Session column holding the value. Fixed strings only, never user input.
    pub fn column(&self) -> &'static str {
        match self {
            Self::BestStreak => "best_streak",
            Self::MakesPerMinute => "makes_per_minute",
            Self::Fastest21 => "fastest_21_makes",
        }
    }

    /// Lower is better for timed metrics.
    pub fn ascending(&self) -> bool {
        matches!(self, Self::Fastest21)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframe_parsing() {
        assert_eq!(Timeframe::parse(None).unwrap(), Timeframe::Weekly);
        assert_eq!(Timeframe::parse(Some("monthly")).unwrap(), Timeframe::Monthly);
        assert_eq!(Timeframe::parse(Some("all_time")).unwrap(), Timeframe::AllTime);
        assert!(Timeframe::parse(Some("yearly")).is_err());
    }

    #[test]
    fn timeframe_windows() {
        let now = Utc::now();
        assert_eq!(Timeframe::Weekly.since(now), Some(now - Duration::days(7)));
        assert_eq!(Timeframe::AllTime.since(now), None);
    }

    #[test]
    fn type_parsing() {
        assert_eq!(LeaderboardType::parse(Some("global")).unwrap(), LeaderboardType::Global);
        assert!(LeaderboardType::parse(Some("friends")).is_err());
    }

    #[test]
    fn fastest_sorts_ascending() {
        assert!(SessionMetric::Fastest21.ascending());
        assert!(!SessionMetric::BestStreak.ascending());
    }
}
