//! Notification inbox endpoints

use std::sync::Arc;

use axum::{body::Bytes, extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::repos::{Notification, NotificationRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiQuery, ValidId};
use crate::http::server::AppState;
use crate::models::{check_id, Window, WindowParams};

#[derive(Debug, Serialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkReadRequest {
    pub notification_id: Option<i64>,
}

impl MarkReadRequest {
    /// An empty body means "mark everything".
    fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| ApiError::BadRequest {
            message: format!("invalid JSON body: {e}"),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub success: bool,
    pub message: &'static str,
    pub updated: u64,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub player_id: i64,
    pub unread_count: i64,
}

/// GET /api/notifications/{playerId}?limit=&offset=
async fn list(
    State(state): State<Arc<AppState>>,
    ValidId(player_id): ValidId,
    ApiQuery(params): ApiQuery<WindowParams>,
) -> Result<Json<NotificationList>, ApiError> {
    let window = Window::from(params);
    let repo = NotificationRepo::new(&state.pool);
    let notifications = repo.list(player_id, window).await?;
    let unread_count = repo.unread_count(player_id).await?;

    Ok(Json(NotificationList {
        notifications,
        unread_count,
        limit: window.limit,
        offset: window.offset,
    }))
}

/// POST /api/notifications/{playerId} - mark one, or all, read
async fn mark_read(
    State(state): State<Arc<AppState>>,
    ValidId(player_id): ValidId,
    body: Bytes,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let req = MarkReadRequest::from_body(&body)?;
    let repo = NotificationRepo::new(&state.pool);

    let response = match req.notification_id {
        Some(id) => {
            let id = check_id("notification_id", id)?;
            MarkReadResponse {
                success: true,
                message: "Notification marked as read",
                updated: repo.mark_read(player_id, id).await?,
            }
        }
        None => MarkReadResponse {
            success: true,
            message: "All notifications marked as read",
            updated: repo.mark_all_read(player_id).await?,
        },
    };
    Ok(Json(response))
}

/// GET /api/notifications/{playerId}/unread_count
async fn unread_count(
    State(state): State<Arc<AppState>>,
    ValidId(player_id): ValidId,
) -> Result<Json<UnreadCount>, ApiError> {
    let unread_count = NotificationRepo::new(&state.pool)
        .unread_count(player_id)
        .await?;
    Ok(Json(UnreadCount {
        player_id,
        unread_count,
    }))
}

/// Notification routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/notifications/{id}", get(list).post(mark_read))
        .route("/api/notifications/{id}/unread_count", get(unread_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_marks_all() {
        assert!(MarkReadRequest::from_body(b"").unwrap().notification_id.is_none());
        assert!(MarkReadRequest::from_body(b"  \n").unwrap().notification_id.is_none());
        assert!(MarkReadRequest::from_body(b"{}").unwrap().notification_id.is_none());
    }

    #[test]
    fn body_names_one_notification() {
        let req = MarkReadRequest::from_body(br#"{"notification_id": 12}"#).unwrap();
        assert_eq!(req.notification_id, Some(12));
    }

    #[test]
    fn garbage_body_is_bad_request() {
        let err = MarkReadRequest::from_body(b"{nope").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { .. }));
    }
}
