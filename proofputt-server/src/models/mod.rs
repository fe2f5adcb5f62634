//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod pagination;
pub mod player;
pub mod session;
pub mod putt_log;
pub mod calibration;
pub mod duel;
pub mod league;
pub mod leaderboard;
pub mod fundraiser;
pub mod notification;

pub use validation::{check_id, parse_id, required, ValidationError};
pub use pagination::{Paginated, Pagination, PaginationParams, Window, WindowParams};
pub use player::{
    validate_link, Email, MembershipTier, NotificationPreferences, Password, PlayerName, Timezone,
};
pub use session::{CategoryCounts, SessionCounts, SessionMetrics, SessionStatus};
pub use putt_log::{PuttLogEntry, SessionReport};
pub use calibration::{CalibrationInput, NewCalibration};
pub use duel::{DuelOutcome, DuelResponse, DuelSettings, DuelSettingsInput, DuelStatus};
pub use league::{
    LeagueSettings, LeagueSettingsInput, LeagueStatus, MemberStatus, PrivacyType, RoundStatus,
    RoundWindow,
};
pub use leaderboard::{LeaderboardType, SessionMetric, Timeframe};
pub use fundraiser::CampaignWindow;
pub use notification::{NewNotification, NotificationKind};
