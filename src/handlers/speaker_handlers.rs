use std::sync::Arc;

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::json;

use crate::{
    dtos::{DashboardResponseDto, OnboardingResponseDto, UpdateSpeakerProfileDto},
    error::{AppError, ErrorMessage},
    middleware::{require_speaker, require_speaker_or_admin, AuthenticatedUser},
    models::{ApprovalStatus, NewNotification, NotificationKind, UserRole},
    AppState,
};

pub fn speaker_handler() -> Router {
    Router::new()
        .route(
            "/dashboard",
            get(dashboard).route_layer(middleware::from_fn(require_speaker_or_admin)),
        )
        .route(
            "/onboarding",
            get(onboarding_state).route_layer(middleware::from_fn(require_speaker)),
        )
        .route(
            "/onboarding/profile",
            put(update_profile).route_layer(middleware::from_fn(require_speaker)),
        )
        .route(
            "/onboarding/submit",
            post(submit_for_review).route_layer(middleware::from_fn(require_speaker)),
        )
}

/// First dashboard hit for a speaker creates their empty profile row
/// (get-or-create), so onboarding always has something to merge into.
async fn dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    let speaker = app_state.db_client.ensure_speaker(&auth.user.id).await?;
    let stats = app_state
        .db_client
        .video_stats_for_owner(&auth.user.id)
        .await?;
    let recent_videos = app_state
        .db_client
        .recent_videos_for_owner(&auth.user.id, 5)
        .await?;

    Ok(Json(DashboardResponseDto {
        status: "success",
        approval_status: speaker.approval_status,
        speaker,
        stats,
        recent_videos,
    }))
}

async fn onboarding_state(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    let speaker = app_state.db_client.ensure_speaker(&auth.user.id).await?;

    Ok(Json(OnboardingResponseDto {
        status: "success",
        completion_percentage: speaker.completion_percentage(),
        missing_fields: speaker.missing_required_fields(),
        speaker,
    }))
}

/// Partial update with merge semantics: fields absent from the request keep
/// their stored value. Never touches approval status.
async fn update_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(body): Json<UpdateSpeakerProfileDto>,
) -> Result<impl IntoResponse, AppError> {
    app_state.db_client.ensure_speaker(&auth.user.id).await?;

    let speaker = app_state
        .db_client
        .update_speaker_profile(
            &auth.user.id,
            body.full_name.as_deref(),
            body.bio.as_deref(),
            body.areas_of_expertise.as_ref(),
            body.profile_picture_url.as_deref(),
            body.intro_video_url.as_deref(),
            body.socials.as_ref(),
        )
        .await?;

    Ok(Json(OnboardingResponseDto {
        status: "success",
        completion_percentage: speaker.completion_percentage(),
        missing_fields: speaker.missing_required_fields(),
        speaker,
    }))
}

/// `NONE/REJECTED -> PENDING` transition. Requires the four mandatory profile
/// fields; refuses a second submission while one is already awaiting review;
/// an approved profile has nothing left to submit.
async fn submit_for_review(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    let speaker = app_state.db_client.ensure_speaker(&auth.user.id).await?;

    let missing = speaker.missing_required_fields();
    if !missing.is_empty() {
        return Err(AppError::incomplete_profile(&missing));
    }

    match speaker.approval_status {
        ApprovalStatus::Pending if speaker.submitted_at.is_some() => {
            return Err(AppError::bad_request(ErrorMessage::AlreadySubmitted.to_str()));
        }
        ApprovalStatus::Approved => {
            return Err(AppError::bad_request("Profile is already approved"));
        }
        _ => {}
    }

    let speaker = app_state
        .db_client
        .submit_speaker_for_review(&auth.user.id)
        .await?;

    if !auth.user.profile_completed {
        if let Err(e) = app_state.db_client.set_profile_completed(&auth.user.id).await {
            tracing::warn!(error = %e, "could not flag profile completion");
        }
    }

    // Review-queue notifications for every admin. The transition has already
    // been persisted; a failed notification is logged, not surfaced.
    let display_name = speaker
        .full_name
        .clone()
        .unwrap_or_else(|| auth.user.name.clone());
    match app_state.db_client.list_users_by_role(UserRole::Admin).await {
        Ok(admins) => {
            for admin in admins {
                let notification = NewNotification {
                    user_id: admin.id,
                    kind: NotificationKind::ReviewNeeded,
                    title: "Speaker profile awaiting review".to_string(),
                    message: format!("{} submitted their speaker profile for review.", display_name),
                    data: json!({"speaker_id": speaker.id}),
                };
                if let Err(e) = app_state.db_client.save_notification(notification).await {
                    tracing::warn!(error = %e, "could not record review notification");
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "could not list admins for review notification"),
    }

    let mailer = app_state.mailer.clone();
    let email = auth.user.email.clone();
    tokio::spawn(async move {
        mailer
            .send(
                &email,
                "Your speaker profile is under review",
                format!(
                    "Hi {},\n\nThanks for completing your speaker profile. Our team will \
                     review it shortly and let you know the outcome.\n",
                    display_name
                ),
            )
            .await;
    });

    Ok(Json(OnboardingResponseDto {
        status: "success",
        completion_percentage: speaker.completion_percentage(),
        missing_fields: vec![],
        speaker,
    }))
}
