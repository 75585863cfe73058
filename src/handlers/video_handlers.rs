use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Query, Request},
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        CreateVideoDto, Response, UpdateVideoDto, VideoApprovalDto, VideoListQueryDto,
        VideoListResponseDto, VideoResponseDto,
    },
    error::{AppError, ErrorMessage},
    middleware::{require_admin, require_speaker_or_admin, AuthenticatedUser},
    models::{ApprovalStatus, NewNotification, NotificationKind, UserRole, Video},
    AppState,
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;
const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

pub fn video_handler() -> Router {
    Router::new()
        .route("/", get(list_videos))
        .route("/{id}", get(get_video))
        .route(
            "/",
            post(create_video)
                .route_layer(middleware::from_fn(require_speaker_or_admin))
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/{id}",
            axum::routing::put(update_video)
                .patch(update_video)
                .delete(delete_video)
                .route_layer(middleware::from_fn(require_speaker_or_admin)),
        )
        .route(
            "/{id}/approval",
            patch(set_video_approval).route_layer(middleware::from_fn(require_admin)),
        )
}

async fn list_videos(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<VideoListQueryDto>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let videos = app_state
        .db_client
        .list_public_videos(query.category.as_deref(), limit, offset)
        .await?;

    Ok(Json(VideoListResponseDto {
        status: "success",
        count: videos.len(),
        videos,
    }))
}

async fn get_video(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(video_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let video = app_state
        .db_client
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::not_found("Video not found"))?;

    Ok(Json(VideoResponseDto {
        status: "success",
        video,
    }))
}

/// Accepts either a multipart upload (file in a `video` field alongside the
/// metadata fields) or a JSON body carrying an external URL. Exactly one
/// content source must be present. Every new video starts out pending,
/// whatever the caller's role.
async fn create_video(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
    req: Request,
) -> Result<impl IntoResponse, AppError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let input = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| AppError::bad_request(e.to_string()))?;
        collect_multipart(multipart).await?
    } else {
        let Json(dto) = Json::<CreateVideoDto>::from_request(req, &())
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        dto.validate()
            .map_err(|e| AppError::bad_request(e.to_string()))?;
        CreateVideoInput {
            title: dto.title,
            description: dto.description,
            category: dto.category,
            video_url: dto.video_url,
            file: None,
        }
    };

    input.validate_content()?;

    let file_path = match &input.file {
        Some((original_name, bytes)) => Some(
            store_upload(&app_state.env.upload_dir, original_name, bytes)
                .await?,
        ),
        None => None,
    };

    let video = app_state
        .db_client
        .save_video(
            &auth.user.id,
            &input.title,
            input.description.as_deref(),
            input.category.as_deref(),
            input.video_url.as_deref(),
            file_path.as_deref(),
        )
        .await?;

    tracing::info!(video_id = %video.id, owner = %auth.user.id, "video submitted for review");

    Ok((
        StatusCode::CREATED,
        Json(VideoResponseDto {
            status: "success",
            video,
        }),
    ))
}

async fn update_video(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(video_id): Path<Uuid>,
    Json(body): Json<UpdateVideoDto>,
) -> Result<impl IntoResponse, AppError> {
    let video = app_state
        .db_client
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::not_found("Video not found"))?;

    check_ownership(&video, &auth)?;

    let updated = app_state
        .db_client
        .update_video(
            &video_id,
            body.title.as_deref(),
            body.description.as_deref(),
            body.category.as_deref(),
        )
        .await?;

    Ok(Json(VideoResponseDto {
        status: "success",
        video: updated,
    }))
}

async fn delete_video(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(video_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let video = app_state
        .db_client
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::not_found("Video not found"))?;

    check_ownership(&video, &auth)?;

    app_state.db_client.delete_video(&video_id).await?;

    // Uploaded content goes with the row. Bookmarks cascade at the store.
    if let Some(file_path) = &video.file_path {
        let path = std::path::Path::new(&app_state.env.upload_dir).join(file_path);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(video_id = %video.id, error = %e, "could not remove uploaded file");
        }
    }

    Ok(Json(Response {
        status: "success",
        message: "Video deleted successfully".to_string(),
    }))
}

async fn set_video_approval(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(video_id): Path<Uuid>,
    Json(body): Json<VideoApprovalDto>,
) -> Result<impl IntoResponse, AppError> {
    let video = apply_video_approval(
        &app_state,
        &video_id,
        body.approved,
        body.reason.as_deref(),
        body.admin_notes.as_deref(),
    )
    .await?;

    Ok(Json(VideoResponseDto {
        status: "success",
        video,
    }))
}

/// Shared transition for the approval PATCH and the admin-dashboard
/// approve/reject endpoints. Rejection keeps the row in a terminal rejected
/// state; only an explicit delete destroys content. The owner notification is
/// written in the same transaction as the status change.
pub(crate) async fn apply_video_approval(
    app_state: &AppState,
    video_id: &Uuid,
    approved: bool,
    reason: Option<&str>,
    admin_notes: Option<&str>,
) -> Result<Video, AppError> {
    let video = app_state
        .db_client
        .get_video(video_id)
        .await?
        .ok_or_else(|| AppError::not_found("Video not found"))?;

    let (status, notification) = if approved {
        (
            ApprovalStatus::Approved,
            NewNotification {
                user_id: video.user_id,
                kind: NotificationKind::VideoApproved,
                title: "Your video is live".to_string(),
                message: format!(
                    "Your video \"{}\" has been approved and is now visible to the audience.",
                    video.title
                ),
                data: json!({"video_id": video.id}),
            },
        )
    } else {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AppError::bad_request(ErrorMessage::MissingReason.to_str()))?;
        (
            ApprovalStatus::Rejected,
            NewNotification {
                user_id: video.user_id,
                kind: NotificationKind::VideoRejected,
                title: "Your video was not approved".to_string(),
                message: format!(
                    "Your video \"{}\" was not approved. Reason: {}",
                    video.title, reason
                ),
                data: json!({"video_id": video.id, "reason": reason}),
            },
        )
    };

    let updated = app_state
        .db_client
        .set_video_approval(video_id, status, admin_notes, notification)
        .await?;

    tracing::info!(video_id = %video_id, status = status.to_str(), "video moderation decision");
    Ok(updated)
}

fn check_ownership(video: &Video, auth: &AuthenticatedUser) -> Result<(), AppError> {
    if video.user_id != auth.user.id && auth.user.role != UserRole::Admin {
        return Err(AppError::forbidden(ErrorMessage::PermissionDenied.to_str()));
    }
    Ok(())
}

#[derive(Debug)]
struct CreateVideoInput {
    title: String,
    description: Option<String>,
    category: Option<String>,
    video_url: Option<String>,
    file: Option<(String, Bytes)>,
}

impl CreateVideoInput {
    fn validate_content(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::bad_request("Title is required"));
        }
        match (self.video_url.as_deref(), &self.file) {
            (None, None) => Err(AppError::bad_request(ErrorMessage::MissingContent.to_str())),
            (Some(_), Some(_)) => Err(AppError::bad_request(
                "Provide either a video file or a URL, not both",
            )),
            _ => Ok(()),
        }
    }
}

async fn collect_multipart(mut multipart: Multipart) -> Result<CreateVideoInput, AppError> {
    let mut input = CreateVideoInput {
        title: String::new(),
        description: None,
        category: None,
        video_url: None,
        file: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.to_string()))?
    {
        match field.name().unwrap_or("") {
            "title" => {
                input.title = field
                    .text()
                    .await
                    .map_err(|e| AppError::bad_request(e.to_string()))?;
            }
            "description" => {
                input.description = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::bad_request(e.to_string()))?,
                );
            }
            "category" => {
                input.category = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::bad_request(e.to_string()))?,
                );
            }
            "video_url" => {
                let url = field
                    .text()
                    .await
                    .map_err(|e| AppError::bad_request(e.to_string()))?;
                if !url.trim().is_empty() {
                    input.video_url = Some(url);
                }
            }
            "video" | "file" => {
                let original_name = field.file_name().unwrap_or("upload.mp4").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(e.to_string()))?;
                input.file = Some((original_name, bytes));
            }
            _ => {}
        }
    }

    Ok(input)
}

/// Writes the upload under a generated name, keeping the original extension.
async fn store_upload(
    upload_dir: &str,
    original_name: &str,
    bytes: &Bytes,
) -> Result<String, AppError> {
    let extension = std::path::Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("mp4");
    let file_name = format!("{}.{}", Uuid::new_v4(), extension);

    tokio::fs::create_dir_all(upload_dir).await.map_err(|e| {
        tracing::error!(error = %e, "could not create upload directory");
        AppError::server_error(ErrorMessage::ServerError.to_str())
    })?;

    let path = std::path::Path::new(upload_dir).join(&file_name);
    tokio::fs::write(&path, bytes).await.map_err(|e| {
        tracing::error!(error = %e, "could not persist upload");
        AppError::server_error(ErrorMessage::ServerError.to_str())
    })?;

    Ok(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(url: Option<&str>, file: bool) -> CreateVideoInput {
        CreateVideoInput {
            title: "Growth mindset basics".to_string(),
            description: None,
            category: Some("mindset,productivity".to_string()),
            video_url: url.map(|u| u.to_string()),
            file: file.then(|| ("talk.mp4".to_string(), Bytes::from_static(b"data"))),
        }
    }

    #[test]
    fn neither_file_nor_url_is_refused() {
        let err = input(None, false).validate_content().unwrap_err();
        assert_eq!(err.message, ErrorMessage::MissingContent.to_str());
    }

    #[test]
    fn both_file_and_url_is_refused() {
        assert!(input(Some("https://example.com/v.mp4"), true)
            .validate_content()
            .is_err());
    }

    #[test]
    fn exactly_one_content_source_is_accepted() {
        assert!(input(Some("https://example.com/v.mp4"), false)
            .validate_content()
            .is_ok());
        assert!(input(None, true).validate_content().is_ok());
    }

    #[test]
    fn blank_title_is_refused() {
        let mut video = input(Some("https://example.com/v.mp4"), false);
        video.title = "  ".to_string();
        assert!(video.validate_content().is_err());
    }
}
