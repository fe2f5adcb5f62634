//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Uses JOINs for list operations (no N+1)
//! - Handles conflicts via ON CONFLICT or constraint errors (no check-then-insert)
//! - Uses transactions for multi-step operations

pub mod players;
pub mod stats;
pub mod sessions;
pub mod calibrations;
pub mod duels;
pub mod leagues;
pub mod leaderboards;
pub mod notifications;
pub mod fundraisers;
pub mod desktop;

pub use players::{NewPlayer, Player, PlayerAggregate, PlayerRepo, PlayerSummary, ProfileUpdate};
pub use stats::PlayerStats;
pub use sessions::{DesktopSubmission, Session, SessionRepo, SessionUpdate};
pub use calibrations::{Calibration, CalibrationRepo};
pub use duels::{Duel, DuelRepo, HeadToHead};
pub use leagues::{
    League, LeagueDetail, LeagueEdit, LeagueMember, LeagueRepo, LeagueRound, LeagueSummary,
    NewLeague, PlayerLeagues, RoundSubmission,
};
pub use leaderboards::{LeaderboardEntry, LeaderboardRepo, Leaderboards};
pub use notifications::{Notification, NotificationRepo};
pub use fundraisers::{Fundraiser, FundraiserDetail, FundraiserRepo, NewFundraiser, Pledge};
pub use desktop::{DesktopRepo, DesktopStatus, Heartbeat};

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Postgres SQLSTATE for foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// Write collides with existing state (duplicate, wrong lifecycle stage)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller is not allowed to act on this record
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Request is well-formed but breaks a rule checked against stored data
    #[error("rejected: {0}")]
    Rejected(String),
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Replace a foreign-key miss with a specific resource.
    pub(crate) fn or_missing(self, resource: &'static str, id: impl ToString) -> Self {
        match self {
            Self::NotFound { .. } => Self::not_found(resource, id),
            other => other,
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            match db.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    return Self::Conflict(format!(
                        "duplicate value violates {}",
                        db.constraint().unwrap_or("a unique constraint")
                    ));
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    return Self::NotFound {
                        resource: "referenced record",
                        id: db.constraint().unwrap_or("unknown").to_owned(),
                    };
                }
                _ => {}
            }
        }
        Self::Sqlx(e)
    }
}
