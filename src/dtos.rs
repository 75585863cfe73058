use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{ApprovalStatus, Speaker, User, Video};

#[derive(Debug, Serialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUserDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginUserDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ForgotPasswordRequestDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetPasswordRequestDto {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyEmailQueryDto {
    pub token: String,
}

/// User shape returned to clients. The password hash and verification token
/// never leave the server.
#[derive(Debug, Clone, Serialize)]
pub struct FilterUserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_paid: bool,
    pub email_verified: bool,
    pub country: Option<String>,
    pub profile_completed: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.to_str().to_string(),
            is_paid: user.is_paid,
            email_verified: user.email_verified,
            country: user.country.clone(),
            profile_completed: user.profile_completed,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize)]
pub struct UserListResponseDto {
    pub status: &'static str,
    pub users: Vec<FilterUserDto>,
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVideoDto {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateVideoDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoApprovalDto {
    pub approved: bool,
    pub reason: Option<String>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectDto {
    pub reason: Option<String>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApproveDto {
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoListQueryDto {
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct VideoResponseDto {
    pub status: &'static str,
    pub video: Video,
}

#[derive(Debug, Serialize)]
pub struct VideoListResponseDto {
    pub status: &'static str,
    pub videos: Vec<Video>,
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSpeakerProfileDto {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub areas_of_expertise: Option<Vec<String>>,
    pub profile_picture_url: Option<String>,
    pub intro_video_url: Option<String>,
    pub socials: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct OnboardingResponseDto {
    pub status: &'static str,
    pub speaker: Speaker,
    pub completion_percentage: u8,
    pub missing_fields: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SpeakerResponseDto {
    pub status: &'static str,
    pub speaker: Speaker,
}

#[derive(Debug, Serialize)]
pub struct SpeakerListResponseDto {
    pub status: &'static str,
    pub speakers: Vec<Speaker>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct VideoStatsDto {
    pub total: i64,
    pub approved: i64,
    pub pending: i64,
    pub rejected: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponseDto {
    pub status: &'static str,
    pub speaker: Speaker,
    pub approval_status: ApprovalStatus,
    pub stats: VideoStatsDto,
    pub recent_videos: Vec<Video>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformStatsDto {
    pub total_users: i64,
    pub subscribers: i64,
    pub speakers: i64,
    pub paid_users: i64,
    pub total_videos: i64,
    pub approved_videos: i64,
    pub pending_videos: i64,
    pub pending_speakers: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookmarkDto {
    pub video_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct BookmarkListResponseDto {
    pub status: &'static str,
    pub videos: Vec<Video>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponseDto {
    pub status: &'static str,
    pub notifications: Vec<crate::models::Notification>,
    pub unread_count: usize,
}

#[derive(Debug, Serialize)]
pub struct PaymentIntentResponseDto {
    pub status: &'static str,
    pub client_secret: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_dto_rejects_malformed_email() {
        let dto = RegisterUserDto {
            name: "A".to_string(),
            email: "not-an-email".to_string(),
            password: "secret123".to_string(),
            role: None,
            country: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn register_dto_rejects_short_password() {
        let dto = RegisterUserDto {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password: "short".to_string(),
            role: None,
            country: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn register_dto_accepts_valid_payload() {
        let dto = RegisterUserDto {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password: "secret123".to_string(),
            role: None,
            country: None,
        };
        assert!(dto.validate().is_ok());
    }
}
