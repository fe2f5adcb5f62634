//! HTTP server layer
//!
//! Axum server with:
//! - Permissive CORS on every route
//! - JSON error bodies, including 404 and 405
//! - Request tracing and timeout
//! - Graceful shutdown

pub mod server;
pub mod error;
pub mod extractors;
pub mod routes;

pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
pub use error::ApiError;
