//! Route handlers organized by resource

pub mod health;
pub mod auth;
pub mod players;
pub mod calibration;
pub mod sessions;
pub mod duels;
pub mod leagues;
pub mod leaderboards;
pub mod notifications;
pub mod fundraisers;
pub mod desktop;
