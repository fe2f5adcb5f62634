//! Login and registration
//!
//! Both return the dashboard aggregate so the client can render without a
//! second round trip. bcrypt runs on the blocking pool.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;

use crate::db::repos::{NewPlayer, PlayerRepo};
use crate::http::error::ApiError;
use crate::http::extractors::ApiJson;
use crate::http::routes::players::PlayerData;
use crate::http::server::AppState;
use crate::models::{required, Email, MembershipTier, Password, PlayerName};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub early_access_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

async fn hash_password(password: Password) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password.expose(), bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| ApiError::Internal {
            message: format!("hashing task failed: {e}"),
        })?
        .map_err(|e| ApiError::Internal {
            message: format!("bcrypt hash failed: {e}"),
        })
}

async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal {
            message: format!("verify task failed: {e}"),
        })?
        .map_err(|e| ApiError::Internal {
            message: format!("bcrypt verify failed: {e}"),
        })
}

/// POST /api/register
async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<PlayerData>), ApiError> {
    let name = PlayerName::new(&required("name", req.name)?)?;
    let email = Email::new(&required("email", req.email)?)?;
    let password = Password::new(&required("password", req.password)?)?;

    let early_access_code = req
        .early_access_code
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty());
    let tier = MembershipTier::for_access_code(early_access_code.as_deref());

    let password_hash = hash_password(password).await?;

    let repo = PlayerRepo::new(&state.pool);
    let player = repo
        .create(NewPlayer {
            email,
            name,
            password_hash,
            tier,
            early_access_code,
        })
        .await?;

    let agg = repo.aggregate(player.player_id).await?;
    Ok((StatusCode::CREATED, Json(PlayerData::from(agg).new_user(true))))
}

/// POST /api/login
async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<PlayerData>, ApiError> {
    let email = required("email", req.email)?;
    let password = required("password", req.password)?;

    // A malformed address can't match any account.
    let email = Email::new(&email).map_err(|_| ApiError::Unauthorized)?;

    let repo = PlayerRepo::new(&state.pool);
    let Some((player_id, hash)) = repo.credentials(&email).await? else {
        tracing::debug!("login for unknown email");
        return Err(ApiError::Unauthorized);
    };

    if !verify_password(password, hash).await? {
        tracing::debug!(player_id, "login with wrong password");
        return Err(ApiError::Unauthorized);
    }

    let agg = repo.aggregate(player_id).await?;
    tracing::info!(player_id, "player logged in");
    Ok(Json(PlayerData::from(agg).new_user(false)))
}

/// Auth routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
}
