use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::dtos::{PlatformStatsDto, VideoStatsDto};
use crate::models::{
    ApprovalStatus, NewNotification, Notification, Speaker, User, UserRole, Video,
};

#[derive(Debug, Clone)]
pub struct DbClient {
    pub pool: PgPool,
}

/// A pending notification joined with its recipient's address, picked up by
/// the email sweep.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OutboundEmail {
    pub notification_id: Uuid,
    pub email: String,
    pub title: String,
    pub message: String,
}

impl DbClient {
    pub fn new(pool: PgPool) -> Self {
        DbClient { pool }
    }

    // ---- users ----

    #[allow(clippy::too_many_arguments)]
    pub async fn save_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
        country: Option<&str>,
        verification_token: &str,
        token_expires_at: DateTime<Utc>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password, role, country, verification_token, token_expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password)
        .bind(role)
        .bind(country)
        .bind(verification_token)
        .bind(token_expires_at)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get_user(
        &self,
        user_id: Option<&Uuid>,
        email: Option<&str>,
        verification_token: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE id = $1 OR email = $2 OR verification_token = $3
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(verification_token)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = $1 ORDER BY created_at")
            .bind(role)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn delete_user(&self, user_id: &Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_last_login(&self, user_id: &Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login = Now(), updated_at = Now() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_verification_token(
        &self,
        user_id: &Uuid,
        token: &str,
        token_expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users SET verification_token = $1, token_expires_at = $2, updated_at = Now()
            WHERE id = $3
            "#,
        )
        .bind(token)
        .bind(token_expires_at)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_email_verified(&self, user_id: &Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET email_verified = TRUE, verification_token = NULL, token_expires_at = NULL,
                updated_at = Now()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_password(
        &self,
        user_id: &Uuid,
        hashed_password: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET password = $1, verification_token = NULL, token_expires_at = NULL,
                updated_at = Now()
            WHERE id = $2
            "#,
        )
        .bind(hashed_password)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_profile_completed(&self, user_id: &Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET profile_completed = TRUE, updated_at = Now() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_user_paid(&self, user_id: &Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_paid = TRUE, updated_at = Now() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ---- speakers ----

    pub async fn get_speaker(&self, speaker_id: &Uuid) -> Result<Option<Speaker>, sqlx::Error> {
        sqlx::query_as::<_, Speaker>("SELECT * FROM speakers WHERE id = $1")
            .bind(speaker_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_speaker_by_user_id(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<Speaker>, sqlx::Error> {
        sqlx::query_as::<_, Speaker>("SELECT * FROM speakers WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Get-or-create semantics: the first dashboard or onboarding hit for a
    /// speaker creates their empty profile row. Safe to call repeatedly.
    pub async fn ensure_speaker(&self, user_id: &Uuid) -> Result<Speaker, sqlx::Error> {
        if let Some(speaker) = self.get_speaker_by_user_id(user_id).await? {
            return Ok(speaker);
        }

        sqlx::query("INSERT INTO speakers (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        sqlx::query_as::<_, Speaker>("SELECT * FROM speakers WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }

    /// Merge semantics: fields left unset in the request keep their stored
    /// value. Approval status is never touched here.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_speaker_profile(
        &self,
        user_id: &Uuid,
        full_name: Option<&str>,
        bio: Option<&str>,
        areas_of_expertise: Option<&Vec<String>>,
        profile_picture_url: Option<&str>,
        intro_video_url: Option<&str>,
        socials: Option<&serde_json::Value>,
    ) -> Result<Speaker, sqlx::Error> {
        sqlx::query_as::<_, Speaker>(
            r#"
            UPDATE speakers
            SET full_name = COALESCE($2, full_name),
                bio = COALESCE($3, bio),
                areas_of_expertise = COALESCE($4::text[], areas_of_expertise),
                profile_picture_url = COALESCE($5, profile_picture_url),
                intro_video_url = COALESCE($6, intro_video_url),
                socials = COALESCE($7::jsonb, socials),
                updated_at = Now()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(full_name)
        .bind(bio)
        .bind(areas_of_expertise)
        .bind(profile_picture_url)
        .bind(intro_video_url)
        .bind(socials)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn submit_speaker_for_review(
        &self,
        user_id: &Uuid,
    ) -> Result<Speaker, sqlx::Error> {
        sqlx::query_as::<_, Speaker>(
            r#"
            UPDATE speakers
            SET approval_status = 'pending', submitted_at = Now(), rejected_at = NULL,
                updated_at = Now()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Applies an admin approval decision and records the recipient-facing
    /// notification in the same transaction, so an approved profile never
    /// silently misses its notification.
    pub async fn set_speaker_approval(
        &self,
        speaker_id: &Uuid,
        status: ApprovalStatus,
        admin_notes: Option<&str>,
        notification: NewNotification,
    ) -> Result<Speaker, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let query = match status {
            ApprovalStatus::Approved => {
                r#"
                UPDATE speakers
                SET approval_status = $2, approved_at = Now(), rejected_at = NULL,
                    admin_notes = COALESCE($3, admin_notes), updated_at = Now()
                WHERE id = $1
                RETURNING *
                "#
            }
            _ => {
                r#"
                UPDATE speakers
                SET approval_status = $2, rejected_at = Now(),
                    admin_notes = COALESCE($3, admin_notes), updated_at = Now()
                WHERE id = $1
                RETURNING *
                "#
            }
        };

        let speaker = sqlx::query_as::<_, Speaker>(query)
            .bind(speaker_id)
            .bind(status)
            .bind(admin_notes)
            .fetch_one(&mut *tx)
            .await?;

        insert_notification(&mut tx, &notification).await?;
        tx.commit().await?;
        Ok(speaker)
    }

    pub async fn list_speakers_by_status(
        &self,
        status: ApprovalStatus,
    ) -> Result<Vec<Speaker>, sqlx::Error> {
        sqlx::query_as::<_, Speaker>(
            "SELECT * FROM speakers WHERE approval_status = $1 ORDER BY submitted_at DESC NULLS LAST",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await
    }

    // ---- videos ----

    pub async fn save_video(
        &self,
        user_id: &Uuid,
        title: &str,
        description: Option<&str>,
        category: Option<&str>,
        video_url: Option<&str>,
        file_path: Option<&str>,
    ) -> Result<Video, sqlx::Error> {
        sqlx::query_as::<_, Video>(
            r#"
            INSERT INTO videos (user_id, title, description, category, video_url, file_path)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(video_url)
        .bind(file_path)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get_video(&self, video_id: &Uuid) -> Result<Option<Video>, sqlx::Error> {
        sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Public catalogue: approved rows only, newest first.
    pub async fn list_public_videos(
        &self,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Video>, sqlx::Error> {
        sqlx::query_as::<_, Video>(
            r#"
            SELECT * FROM videos
            WHERE status = 'approved'
              AND ($1::text IS NULL OR category ILIKE '%' || $1 || '%')
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(category)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    /// Moderation queue and other status-scoped listings, newest first.
    pub async fn list_videos_by_status(
        &self,
        status: ApprovalStatus,
    ) -> Result<Vec<Video>, sqlx::Error> {
        sqlx::query_as::<_, Video>(
            "SELECT * FROM videos WHERE status = $1 ORDER BY created_at DESC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn update_video(
        &self,
        video_id: &Uuid,
        title: Option<&str>,
        description: Option<&str>,
        category: Option<&str>,
    ) -> Result<Video, sqlx::Error> {
        sqlx::query_as::<_, Video>(
            r#"
            UPDATE videos
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                updated_at = Now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(video_id)
        .bind(title)
        .bind(description)
        .bind(category)
        .fetch_one(&self.pool)
        .await
    }

    /// Applies an admin approval decision; the owner notification lands in the
    /// same transaction as the status flip.
    pub async fn set_video_approval(
        &self,
        video_id: &Uuid,
        status: ApprovalStatus,
        admin_notes: Option<&str>,
        notification: NewNotification,
    ) -> Result<Video, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let video = sqlx::query_as::<_, Video>(
            r#"
            UPDATE videos
            SET status = $2, admin_notes = COALESCE($3, admin_notes), updated_at = Now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(video_id)
        .bind(status)
        .bind(admin_notes)
        .fetch_one(&mut *tx)
        .await?;

        insert_notification(&mut tx, &notification).await?;
        tx.commit().await?;
        Ok(video)
    }

    pub async fn delete_video(&self, video_id: &Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(video_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn video_stats_for_owner(
        &self,
        user_id: &Uuid,
    ) -> Result<VideoStatsDto, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'approved') AS approved,
                   COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                   COUNT(*) FILTER (WHERE status = 'rejected') AS rejected
            FROM videos WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(VideoStatsDto {
            total: row.get("total"),
            approved: row.get("approved"),
            pending: row.get("pending"),
            rejected: row.get("rejected"),
        })
    }

    pub async fn recent_videos_for_owner(
        &self,
        user_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<Video>, sqlx::Error> {
        sqlx::query_as::<_, Video>(
            "SELECT * FROM videos WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    // ---- bookmarks ----

    /// Idempotent: a duplicate (user, video) pair is a no-op, reported through
    /// the returned row count.
    pub async fn save_bookmark(
        &self,
        user_id: &Uuid,
        video_id: &Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO bookmarks (user_id, video_id) VALUES ($1, $2)
            ON CONFLICT (user_id, video_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(video_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_bookmark(
        &self,
        user_id: &Uuid,
        video_id: &Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND video_id = $2")
            .bind(user_id)
            .bind(video_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_bookmarked_videos(&self, user_id: &Uuid) -> Result<Vec<Video>, sqlx::Error> {
        sqlx::query_as::<_, Video>(
            r#"
            SELECT v.* FROM videos v
            JOIN bookmarks b ON b.video_id = v.id
            WHERE b.user_id = $1 AND v.status = 'approved'
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    // ---- notifications ----

    pub async fn save_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, kind, title, message, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.data)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_notifications(&self, user_id: &Uuid) -> Result<Vec<Notification>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn mark_notification_read(
        &self,
        notification_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn mark_all_notifications_read(&self, user_id: &Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Undelivered notifications whose recipient has a verified address.
    /// Verification emails themselves are sent inline at signup, not here.
    pub async fn unsent_email_notifications(
        &self,
        limit: i64,
    ) -> Result<Vec<OutboundEmail>, sqlx::Error> {
        sqlx::query_as::<_, OutboundEmail>(
            r#"
            SELECT n.id AS notification_id, u.email, n.title, n.message
            FROM notifications n
            JOIN users u ON u.id = n.user_id
            WHERE n.email_sent = FALSE AND u.email_verified = TRUE
            ORDER BY n.created_at
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn mark_email_sent(&self, notification_id: &Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE notifications SET email_sent = TRUE WHERE id = $1")
            .bind(notification_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ---- admin stats ----

    pub async fn platform_stats(&self) -> Result<PlatformStatsDto, sqlx::Error> {
        let users = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE role = 'subscriber') AS subscribers,
                   COUNT(*) FILTER (WHERE role = 'speaker') AS speakers,
                   COUNT(*) FILTER (WHERE is_paid) AS paid
            FROM users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let videos = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'approved') AS approved,
                   COUNT(*) FILTER (WHERE status = 'pending') AS pending
            FROM videos
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let pending_speakers = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM speakers WHERE approval_status = 'pending' AND submitted_at IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(PlatformStatsDto {
            total_users: users.get("total"),
            subscribers: users.get("subscribers"),
            speakers: users.get("speakers"),
            paid_users: users.get("paid"),
            total_videos: videos.get("total"),
            approved_videos: videos.get("approved"),
            pending_videos: videos.get("pending"),
            pending_speakers,
        })
    }
}

async fn insert_notification(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    notification: &NewNotification,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO notifications (user_id, kind, title, message, data)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(notification.user_id)
    .bind(notification.kind)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(&notification.data)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
