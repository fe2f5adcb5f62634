//! League settings, statuses and round scheduling

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::ValidationError;

const MAX_LEAGUE_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 1000;

const MAX_ROUNDS: i32 = 52;
const MAX_ROUND_HOURS: i32 = 2160;
const MAX_TIME_LIMIT_MINUTES: i32 = 1440;

/// League visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyType {
    Public,
    Private,
}

impl PrivacyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            _ => Err(ValidationError::InvalidVariant {
                field: "privacy_type",
                value: s.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeagueStatus {
    Registering,
    Active,
    Completed,
}

impl LeagueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registering => "registering",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Scheduled,
    Active,
    Completed,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Status of a round window at `now`.
    pub fn at(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if end <= now {
            Self::Completed
        } else if start <= now {
            Self::Active
        } else {
            Self::Scheduled
        }
    }
}

/// Member standing within a league
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Invited,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Invited => "invited",
        }
    }
}

/// Settings bundle stored as JSONB on the league row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueSettings {
    pub num_rounds: i32,
    pub round_duration_hours: i32,
    pub time_limit_minutes: i32,
    pub allow_player_invites: bool,
}

impl Default for LeagueSettings {
    fn default() -> Self {
        Self {
            num_rounds: 4,
            round_duration_hours: 168,
            time_limit_minutes: 15,
            allow_player_invites: false,
        }
    }
}

impl LeagueSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_ROUNDS).contains(&self.num_rounds) {
            return Err(ValidationError::OutOfRange {
                field: "num_rounds",
                reason: "must be between 1 and 52",
            });
        }
        if !(1..=MAX_ROUND_HOURS).contains(&self.round_duration_hours) {
            return Err(ValidationError::OutOfRange {
                field: "round_duration_hours",
                reason: "must be between 1 and 2160",
            });
        }
        if !(1..=MAX_TIME_LIMIT_MINUTES).contains(&self.time_limit_minutes) {
            return Err(ValidationError::OutOfRange {
                field: "time_limit_minutes",
                reason: "must be between 1 and 1440",
            });
        }
        Ok(())
    }

    pub fn round_duration(&self) -> Duration {
        Duration::hours(self.round_duration_hours as i64)
    }
}

/// Partial settings from a create or update request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeagueSettingsInput {
    pub num_rounds: Option<i32>,
    pub round_duration_hours: Option<i32>,
    pub time_limit_minutes: Option<i32>,
    pub allow_player_invites: Option<bool>,
}

impl LeagueSettingsInput {
    /// Overlay onto `base` and validate the result.
    pub fn apply(self, base: LeagueSettings) -> Result<LeagueSettings, ValidationError> {
        let merged = LeagueSettings {
            num_rounds: self.num_rounds.unwrap_or(base.num_rounds),
            round_duration_hours: self.round_duration_hours.unwrap_or(base.round_duration_hours),
            time_limit_minutes: self.time_limit_minutes.unwrap_or(base.time_limit_minutes),
            allow_player_invites: self.allow_player_invites.unwrap_or(base.allow_player_invites),
        };
        merged.validate()?;
        Ok(merged)
    }
}

/// One scheduled round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundWindow {
    pub round_number: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Consecutive rounds starting at `start`, numbered from 1.
pub fn schedule_rounds(start: DateTime<Utc>, settings: &LeagueSettings) -> Vec<RoundWindow> {
    let len = settings.round_duration();
    (0..settings.num_rounds)
        .map(|i| {
            let round_start = start + len * i;
            RoundWindow {
                round_number: i + 1,
                start_time: round_start,
                end_time: round_start + len,
            }
        })
        .collect()
}

/// Parse a league start time.
///
/// RFC 3339 values with an offset are taken as-is. Wall-clock values
/// (`2026-03-01T18:00` or `2026-03-01 18:00:00`) are read in `tz`.
pub fn parse_start_time(s: &str, tz: Tz) -> Result<DateTime<Utc>, ValidationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ValidationError::Empty { field: "start_time" });
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    let naive = FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .ok_or(ValidationError::InvalidFormat {
            field: "start_time",
            reason: "expected YYYY-MM-DDTHH:MM or an RFC 3339 timestamp",
        })?;

    localize_start_time(naive, tz)
}

/// Interpret a wall-clock time in `tz`. Ambiguous times (DST fall-back)
/// resolve to the earlier instant; skipped times (DST spring-forward) fail.
pub fn localize_start_time(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, ValidationError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(ValidationError::InvalidFormat {
            field: "start_time",
            reason: "does not exist in the creator's timezone",
        }),
    }
}

pub fn validate_league_name(s: &str) -> Result<String, ValidationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ValidationError::Empty { field: "name" });
    }
    if s.chars().count() > MAX_LEAGUE_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name",
            max: MAX_LEAGUE_NAME_LEN,
        });
    }
    Ok(s.to_owned())
}

pub fn validate_description(s: &str) -> Result<String, ValidationError> {
    let s = s.trim();
    if s.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description",
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(s.to_owned())
}
