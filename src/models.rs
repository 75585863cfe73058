use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Speaker,
    Subscriber,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Speaker => "speaker",
            UserRole::Subscriber => "subscriber",
        }
    }

    /// Signup allow-list. Anything outside the three known roles is rejected
    /// rather than defaulted, so a typo never silently creates a subscriber.
    pub fn parse(value: &str) -> Option<UserRole> {
        match value {
            "admin" => Some(UserRole::Admin),
            "speaker" => Some(UserRole::Speaker),
            "subscriber" => Some(UserRole::Subscriber),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, sqlx::Type)]
#[sqlx(type_name = "approval_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    EmailVerification,
    SpeakerApproved,
    SpeakerRejected,
    VideoApproved,
    VideoRejected,
    Milestone,
    ReviewNeeded,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(skip_serializing)]
    pub password: String,
    pub is_paid: bool,
    pub email_verified: bool,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub token_expires_at: Option<DateTime<Utc>>,
    pub country: Option<String>,
    pub profile_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Speaker {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub areas_of_expertise: Vec<String>,
    pub profile_picture_url: Option<String>,
    pub intro_video_url: Option<String>,
    pub socials: serde_json::Value,
    pub approval_status: ApprovalStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Speaker {
    /// Required onboarding fields that are still empty. A profile may only be
    /// submitted for review once this list is empty.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !Self::is_set(&self.bio) {
            missing.push("bio");
        }
        if !Self::is_set(&self.full_name) {
            missing.push("full_name");
        }
        if self.areas_of_expertise.is_empty() {
            missing.push("areas_of_expertise");
        }
        if !Self::is_set(&self.profile_picture_url) {
            missing.push("profile_picture_url");
        }
        missing
    }

    /// Profile completion out of 100, counting the four required fields plus
    /// the two optional ones (intro video, socials). Display only.
    pub fn completion_percentage(&self) -> u8 {
        let required_total = 4;
        let optional_total = 2;
        let mut satisfied = required_total - self.missing_required_fields().len();
        if Self::is_set(&self.intro_video_url) {
            satisfied += 1;
        }
        if self
            .socials
            .as_object()
            .is_some_and(|map| !map.is_empty())
        {
            satisfied += 1;
        }
        (satisfied * 100 / (required_total + optional_total)) as u8
    }

    fn is_set(field: &Option<String>) -> bool {
        field.as_deref().is_some_and(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Video {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub video_url: Option<String>,
    pub file_path: Option<String>,
    pub status: ApprovalStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Bookmark {
    pub user_id: Uuid,
    pub video_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub read: bool,
    pub email_sent: bool,
    pub created_at: DateTime<Utc>,
}

/// A notification to be inserted alongside a lifecycle transition, in the same
/// transaction as the state change it announces.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blank_speaker() -> Speaker {
        Speaker {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            full_name: None,
            bio: None,
            areas_of_expertise: vec![],
            profile_picture_url: None,
            intro_video_url: None,
            socials: json!({}),
            approval_status: ApprovalStatus::Pending,
            submitted_at: None,
            approved_at: None,
            rejected_at: None,
            admin_notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn role_parse_allows_known_roles_only() {
        assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("speaker"), Some(UserRole::Speaker));
        assert_eq!(UserRole::parse("subscriber"), Some(UserRole::Subscriber));
        assert_eq!(UserRole::parse("superuser"), None);
        assert_eq!(UserRole::parse("Admin"), None);
    }

    #[test]
    fn blank_profile_is_missing_all_required_fields() {
        let speaker = blank_speaker();
        assert_eq!(
            speaker.missing_required_fields(),
            vec!["bio", "full_name", "areas_of_expertise", "profile_picture_url"]
        );
        assert_eq!(speaker.completion_percentage(), 0);
    }

    #[test]
    fn whitespace_only_fields_count_as_missing() {
        let mut speaker = blank_speaker();
        speaker.bio = Some("   ".to_string());
        assert!(speaker.missing_required_fields().contains(&"bio"));
    }

    #[test]
    fn required_fields_alone_reach_two_thirds_completion() {
        let mut speaker = blank_speaker();
        speaker.bio = Some("Helping teams grow".to_string());
        speaker.full_name = Some("Dana Okafor".to_string());
        speaker.areas_of_expertise = vec!["leadership".to_string()];
        speaker.profile_picture_url = Some("https://cdn.example.com/dana.jpg".to_string());
        assert!(speaker.missing_required_fields().is_empty());
        assert_eq!(speaker.completion_percentage(), 66);
    }

    #[test]
    fn full_profile_reaches_full_completion() {
        let mut speaker = blank_speaker();
        speaker.bio = Some("Helping teams grow".to_string());
        speaker.full_name = Some("Dana Okafor".to_string());
        speaker.areas_of_expertise = vec!["leadership".to_string()];
        speaker.profile_picture_url = Some("https://cdn.example.com/dana.jpg".to_string());
        speaker.intro_video_url = Some("https://videos.example.com/intro.mp4".to_string());
        speaker.socials = json!({"twitter": "@dana"});
        assert_eq!(speaker.completion_percentage(), 100);
    }

    #[test]
    fn user_serialization_never_exposes_password() {
        let user = User {
            id: Uuid::new_v4(),
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            role: UserRole::Subscriber,
            password: "$argon2id$secret".to_string(),
            is_paid: false,
            email_verified: false,
            verification_token: Some("tok".to_string()),
            token_expires_at: None,
            country: None,
            profile_completed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login: None,
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password").is_none());
        assert!(value.get("verification_token").is_none());
    }
}
