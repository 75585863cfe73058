use std::sync::Arc;

use axum::{
    extract::Path,
    middleware,
    response::IntoResponse,
    routing::{delete, get},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::{FilterUserDto, Response, UserListResponseDto},
    error::{AppError, ErrorMessage},
    middleware::{require_admin, AuthenticatedUser},
    AppState,
};

pub fn user_handler() -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", delete(delete_user))
        .route_layer(middleware::from_fn(require_admin))
}

async fn list_users(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let users = app_state.db_client.list_users().await?;
    let users = users.iter().map(FilterUserDto::filter_user).collect::<Vec<_>>();

    Ok(Json(UserListResponseDto {
        status: "success",
        count: users.len(),
        users,
    }))
}

/// Hard delete; owned speakers, videos, bookmarks, and notifications cascade
/// at the store. Admins cannot delete themselves.
async fn delete_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if user_id == auth.user.id {
        return Err(AppError::forbidden(ErrorMessage::PermissionDenied.to_str()));
    }

    let removed = app_state.db_client.delete_user(&user_id).await?;
    if removed == 0 {
        return Err(AppError::not_found("User not found"));
    }

    tracing::info!(deleted_user = %user_id, admin = %auth.user.id, "user deleted");

    Ok(Json(Response {
        status: "success",
        message: "User deleted successfully".to_string(),
    }))
}
