use std::sync::Arc;

use axum::{
    extract::Path,
    middleware,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::{NotificationListResponseDto, Response},
    error::AppError,
    middleware::{require_auth, AuthenticatedUser},
    AppState,
};

pub fn notification_handler() -> Router {
    Router::new()
        .route("/", get(list_notifications))
        .route("/{id}/read", put(mark_read))
        .route("/read-all", put(mark_all_read))
        .route_layer(middleware::from_fn(require_auth))
}

async fn list_notifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    let notifications = app_state.db_client.list_notifications(&auth.user.id).await?;
    let unread_count = notifications.iter().filter(|n| !n.read).count();

    Ok(Json(NotificationListResponseDto {
        status: "success",
        notifications,
        unread_count,
    }))
}

/// Recipient-scoped: marking someone else's notification reads as missing.
async fn mark_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let updated = app_state
        .db_client
        .mark_notification_read(&notification_id, &auth.user.id)
        .await?;

    if updated == 0 {
        return Err(AppError::not_found("Notification not found"));
    }

    Ok(Json(Response {
        status: "success",
        message: "Notification marked as read".to_string(),
    }))
}

async fn mark_all_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    let updated = app_state
        .db_client
        .mark_all_notifications_read(&auth.user.id)
        .await?;

    Ok(Json(Response {
        status: "success",
        message: format!("{} notifications marked as read", updated),
    }))
}
