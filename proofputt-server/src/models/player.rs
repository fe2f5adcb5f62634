//! Player identity values: email, display name, password, tier, timezone

use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ValidationError;

const MAX_NAME_LEN: usize = 64;
const MAX_EMAIL_LEN: usize = 254;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 72;
const MAX_URL_LEN: usize = 512;

/// Coupon that grants the premium tier.
pub const EARLY_ACCESS_CODE: &str = "early";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("invalid email regex")
});

/// Validated, lower-cased email address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Trim, lower-case and check the address shape.
    ///
    /// ```
    /// use proofputt_server::models::Email;
    ///
    /// assert_eq!(Email::new(" Pop@Example.com ").unwrap().as_str(), "pop@example.com");
    /// assert!(Email::new("not-an-email").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }
        if s.len() > MAX_EMAIL_LEN {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_EMAIL_LEN,
            });
        }
        if !EMAIL_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "must look like name@example.com",
            });
        }
        Ok(Self(s.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }
        if s.chars().count() > MAX_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "name",
                max: MAX_NAME_LEN,
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Plaintext password that passed length checks. Never serialized.
pub struct Password(String);

impl Password {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "password" });
        }
        if s.len() < MIN_PASSWORD_LEN {
            return Err(ValidationError::TooShort {
                field: "password",
                min: MIN_PASSWORD_LEN,
            });
        }
        // bcrypt ignores bytes past 72
        if s.len() > MAX_PASSWORD_LEN {
            return Err(ValidationError::TooLong {
                field: "password",
                max: MAX_PASSWORD_LEN,
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

/// Membership tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipTier {
    Basic,
    Premium,
}

impl MembershipTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Premium => "premium",
        }
    }

    /// Tier granted at registration for an optional early access code.
    pub fn for_access_code(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            Some(EARLY_ACCESS_CODE) => Self::Premium,
            _ => Self::Basic,
        }
    }

    /// Subscription status that goes with the tier.
    pub fn subscription_status(&self) -> &'static str {
        match self {
            Self::Basic => "free",
            Self::Premium => ACTIVE_SUBSCRIPTION,
        }
    }
}

/// Subscription status that unlocks full session history.
pub const ACTIVE_SUBSCRIPTION: &str = "active";

/// Validated IANA timezone name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timezone(Tz);

impl Timezone {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        s.trim()
            .parse::<Tz>()
            .map(Self)
            .map_err(|_| ValidationError::InvalidVariant {
                field: "timezone",
                value: s.to_owned(),
            })
    }

    /// Parse a stored timezone, falling back to UTC for unknown names.
    pub fn or_utc(s: &str) -> Tz {
        s.parse::<Tz>().unwrap_or(Tz::UTC)
    }

    pub fn tz(&self) -> Tz {
        self.0
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }
}

/// Optional social/profile link
pub fn validate_link(field: &'static str, s: &str) -> Result<String, ValidationError> {
    let s = s.trim();
    if s.len() > MAX_URL_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_URL_LEN,
        });
    }
    if !s.is_empty() && !(s.starts_with("http://") || s.starts_with("https://")) {
        return Err(ValidationError::InvalidFormat {
            field,
            reason: "must start with http:// or https://",
        });
    }
    Ok(s.to_owned())
}

/// Per-player notification preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    pub duel_challenges: bool,
    pub league_updates: bool,
    pub achievements: bool,
    pub weekly_summary: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            duel_challenges: true,
            league_updates: true,
            achievements: true,
            weekly_summary: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        let email = Email::new("  POP@ProofOfPutt.com").unwrap();
        assert_eq!(email.as_str(), "pop@proofofputt.com");
    }

    #[test]
    fn email_rejects_bad_shapes() {
        assert!(matches!(
            Email::new("").unwrap_err(),
            ValidationError::Empty { .. }
        ));
        assert!(matches!(
            Email::new("pop@localhost").unwrap_err(),
            ValidationError::InvalidFormat { .. }
        ));
        assert!(matches!(
            Email::new("two words@example.com").unwrap_err(),
            ValidationError::InvalidFormat { .. }
        ));
    }

    #[test]
    fn name_limits() {
        assert!(PlayerName::new("Pop").is_ok());
        assert!(PlayerName::new("   ").is_err());
        assert!(PlayerName::new(&"x".repeat(65)).is_err());
    }

    #[test]
    fn password_length() {
        assert!(Password::new("short").is_err());
        assert!(Password::new("passwordpop123").is_ok());
        assert!(Password::new(&"p".repeat(73)).is_err());
    }

    #[test]
    fn early_code_grants_premium() {
        assert_eq!(MembershipTier::for_access_code(Some("early")), MembershipTier::Premium);
        assert_eq!(MembershipTier::for_access_code(Some("late")), MembershipTier::Basic);
        assert_eq!(MembershipTier::for_access_code(None), MembershipTier::Basic);
        assert_eq!(MembershipTier::Premium.subscription_status(), "active");
        assert_eq!(MembershipTier::Basic.subscription_status(), "free");
    }

    #[test]
    fn timezone_parsing() {
        assert_eq!(Timezone::new("America/New_York").unwrap().name(), "America/New_York");
        assert!(Timezone::new("Mars/Olympus").is_err());
        assert_eq!(Timezone::or_utc("nonsense"), Tz::UTC);
    }

    #[test]
    fn links_need_scheme() {
        assert!(validate_link("x_url", "https://x.com/pop").is_ok());
        assert!(validate_link("x_url", "").is_ok());
        assert!(validate_link("x_url", "x.com/pop").is_err());
    }

    #[test]
    fn preferences_fill_missing_fields() {
        let prefs: NotificationPreferences =
            serde_json::from_str(r#"{"weekly_summary": true}"#).unwrap();
        assert!(prefs.duel_challenges);
        assert!(prefs.weekly_summary);
    }
}
