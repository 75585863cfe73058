use std::sync::Arc;

use axum::{
    extract::Path,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    dtos::{
        ApproveDto, PlatformStatsDto, RejectDto, SpeakerListResponseDto, SpeakerResponseDto,
        VideoListResponseDto, VideoResponseDto,
    },
    error::{AppError, ErrorMessage},
    handlers::video_handlers::apply_video_approval,
    middleware::require_admin,
    models::{ApprovalStatus, NewNotification, NotificationKind, Speaker},
    AppState,
};

#[derive(Debug, Serialize)]
struct StatsResponseDto {
    status: &'static str,
    stats: PlatformStatsDto,
}

pub fn admin_handler() -> Router {
    Router::new()
        .route("/stats", get(platform_stats))
        .route("/speakers", get(list_pending_speakers))
        .route("/speakers/{id}/approve", post(approve_speaker))
        .route("/speakers/{id}/reject", post(reject_speaker))
        .route("/videos", get(list_pending_videos))
        .route("/videos/{id}/approve", post(approve_video))
        .route("/videos/{id}/reject", post(reject_video))
        .route_layer(middleware::from_fn(require_admin))
}

async fn platform_stats(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let stats = app_state.db_client.platform_stats().await?;
    Ok(Json(StatsResponseDto {
        status: "success",
        stats,
    }))
}

/// Speaker moderation queue: submitted profiles awaiting a decision.
async fn list_pending_speakers(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let speakers = app_state
        .db_client
        .list_speakers_by_status(ApprovalStatus::Pending)
        .await?
        .into_iter()
        .filter(|speaker| speaker.submitted_at.is_some())
        .collect::<Vec<_>>();

    Ok(Json(SpeakerListResponseDto {
        status: "success",
        count: speakers.len(),
        speakers,
    }))
}

async fn approve_speaker(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(speaker_id): Path<Uuid>,
    body: Option<Json<ApproveDto>>,
) -> Result<impl IntoResponse, AppError> {
    let admin_notes = body.as_ref().and_then(|b| b.admin_notes.clone());

    let speaker = load_speaker(&app_state, &speaker_id).await?;
    let notification = NewNotification {
        user_id: speaker.user_id,
        kind: NotificationKind::SpeakerApproved,
        title: "Your speaker profile is approved".to_string(),
        message: "Congratulations! Your speaker profile has been approved. You can now \
                  publish videos on MindLift."
            .to_string(),
        data: json!({"speaker_id": speaker.id}),
    };

    let speaker = app_state
        .db_client
        .set_speaker_approval(
            &speaker_id,
            ApprovalStatus::Approved,
            admin_notes.as_deref(),
            notification,
        )
        .await?;

    tracing::info!(speaker_id = %speaker_id, "speaker approved");

    Ok(Json(SpeakerResponseDto {
        status: "success",
        speaker,
    }))
}

async fn reject_speaker(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(speaker_id): Path<Uuid>,
    body: Option<Json<RejectDto>>,
) -> Result<impl IntoResponse, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or(RejectDto {
        reason: None,
        admin_notes: None,
    });

    let reason = body
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::bad_request(ErrorMessage::MissingReason.to_str()))?;

    let speaker = load_speaker(&app_state, &speaker_id).await?;
    let notification = NewNotification {
        user_id: speaker.user_id,
        kind: NotificationKind::SpeakerRejected,
        title: "Your speaker profile needs changes".to_string(),
        message: format!(
            "Your speaker profile was not approved. Reason: {}. You can update your \
             profile and submit it again.",
            reason
        ),
        data: json!({"speaker_id": speaker.id, "reason": reason}),
    };

    let speaker = app_state
        .db_client
        .set_speaker_approval(
            &speaker_id,
            ApprovalStatus::Rejected,
            body.admin_notes.as_deref(),
            notification,
        )
        .await?;

    tracing::info!(speaker_id = %speaker_id, "speaker rejected");

    Ok(Json(SpeakerResponseDto {
        status: "success",
        speaker,
    }))
}

/// Video moderation queue: pending uploads, newest first.
async fn list_pending_videos(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let videos = app_state
        .db_client
        .list_videos_by_status(ApprovalStatus::Pending)
        .await?;

    Ok(Json(VideoListResponseDto {
        status: "success",
        count: videos.len(),
        videos,
    }))
}

async fn approve_video(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(video_id): Path<Uuid>,
    body: Option<Json<ApproveDto>>,
) -> Result<impl IntoResponse, AppError> {
    let admin_notes = body.as_ref().and_then(|b| b.admin_notes.clone());
    let video =
        apply_video_approval(&app_state, &video_id, true, None, admin_notes.as_deref()).await?;

    Ok(Json(VideoResponseDto {
        status: "success",
        video,
    }))
}

async fn reject_video(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(video_id): Path<Uuid>,
    body: Option<Json<RejectDto>>,
) -> Result<impl IntoResponse, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or(RejectDto {
        reason: None,
        admin_notes: None,
    });

    let video = apply_video_approval(
        &app_state,
        &video_id,
        false,
        body.reason.as_deref(),
        body.admin_notes.as_deref(),
    )
    .await?;

    Ok(Json(VideoResponseDto {
        status: "success",
        video,
    }))
}

async fn load_speaker(app_state: &AppState, speaker_id: &Uuid) -> Result<Speaker, AppError> {
    app_state
        .db_client
        .get_speaker(speaker_id)
        .await?
        .ok_or_else(|| AppError::not_found("Speaker profile not found"))
}
