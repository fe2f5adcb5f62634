//! Notifications produced by duel and league events

use serde_json::{json, Value};

/// Notification category, stored in the `type` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    DuelInvite,
    DuelResponse,
    DuelComplete,
    LeagueInvite,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuelInvite => "duel_invite",
            Self::DuelResponse => "duel_response",
            Self::DuelComplete => "duel_complete",
            Self::LeagueInvite => "league_invite",
        }
    }
}

/// Notification ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub player_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link_path: Option<String>,
    pub details: Value,
}

impl NewNotification {
    pub fn duel_invite(invited_id: i64, duel_id: i64, creator_name: &str) -> Self {
        Self {
            player_id: invited_id,
            kind: NotificationKind::DuelInvite,
            title: "New duel challenge".to_owned(),
            message: format!("{creator_name} challenged you to a duel"),
            link_path: Some("/duels".to_owned()),
            details: json!({ "duel_id": duel_id }),
        }
    }

    pub fn duel_response(creator_id: i64, duel_id: i64, responder_name: &str, accepted: bool) -> Self {
        let verb = if accepted { "accepted" } else { "declined" };
        Self {
            player_id: creator_id,
            kind: NotificationKind::DuelResponse,
            title: format!("Duel {verb}"),
            message: format!("{responder_name} {verb} your duel challenge"),
            link_path: Some("/duels".to_owned()),
            details: json!({ "duel_id": duel_id, "response": verb }),
        }
    }

    pub fn duel_complete(player_id: i64, duel_id: i64, winner_id: Option<i64>) -> Self {
        let message = match winner_id {
            Some(id) if id == player_id => "You won your duel".to_owned(),
            Some(_) => "You lost your duel".to_owned(),
            None => "Your duel ended in a draw".to_owned(),
        };
        Self {
            player_id,
            kind: NotificationKind::DuelComplete,
            title: "Duel complete".to_owned(),
            message,
            link_path: Some("/duels".to_owned()),
            details: json!({ "duel_id": duel_id, "winner_id": winner_id }),
        }
    }

    pub fn league_invite(invitee_id: i64, league_id: i64, league_name: &str, inviter_name: &str) -> Self {
        Self {
            player_id: invitee_id,
            kind: NotificationKind::LeagueInvite,
            title: "League invitation".to_owned(),
            message: format!("{inviter_name} invited you to join {league_name}"),
            link_path: Some(format!("/leagues/{league_id}")),
            details: json!({ "league_id": league_id }),
        }
    }
}
