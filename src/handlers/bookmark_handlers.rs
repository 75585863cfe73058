use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::{BookmarkListResponseDto, CreateBookmarkDto, Response},
    error::AppError,
    middleware::{require_member, AuthenticatedUser},
    AppState,
};

pub fn bookmark_handler() -> Router {
    Router::new()
        .route("/", get(list_bookmarks).post(create_bookmark))
        .route("/{video_id}", delete(delete_bookmark))
        .route_layer(middleware::from_fn(require_member))
}

async fn list_bookmarks(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    let videos = app_state
        .db_client
        .list_bookmarked_videos(&auth.user.id)
        .await?;

    Ok(Json(BookmarkListResponseDto {
        status: "success",
        count: videos.len(),
        videos,
    }))
}

/// Idempotent: bookmarking the same video twice leaves a single row and still
/// reports success.
async fn create_bookmark(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(body): Json<CreateBookmarkDto>,
) -> Result<impl IntoResponse, AppError> {
    let result = app_state
        .db_client
        .save_bookmark(&auth.user.id, &body.video_id)
        .await;

    match result {
        Ok(_) => Ok((
            StatusCode::CREATED,
            Json(Response {
                status: "success",
                message: "Video bookmarked".to_string(),
            }),
        )),
        Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
            Err(AppError::not_found("Video not found"))
        }
        Err(e) => Err(AppError::from(e)),
    }
}

async fn delete_bookmark(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(video_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let removed = app_state
        .db_client
        .delete_bookmark(&auth.user.id, &video_id)
        .await?;

    if removed == 0 {
        return Err(AppError::not_found("Bookmark not found"));
    }

    Ok(Json(Response {
        status: "success",
        message: "Bookmark removed".to_string(),
    }))
}
