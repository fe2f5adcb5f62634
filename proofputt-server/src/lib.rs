//! proofputt-server: HTTP API for the Proof of Putt putting tracker
//!
//! Players, sessions, camera calibration, duels, leagues, leaderboards,
//! notifications, fundraisers and desktop-companion status over a
//! PostgreSQL store.

pub mod db;
pub mod http;
pub mod models;

pub use db::{create_lazy_pool, create_pool, create_pool_with_options};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
