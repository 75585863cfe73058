//! Store-level lifecycle tests. These need a real PostgreSQL instance and are
//! ignored by default; run them with
//! `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.

use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use mindlift_backend::db::DbClient;
use mindlift_backend::models::{ApprovalStatus, NewNotification, NotificationKind, UserRole};

async fn client() -> DbClient {
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must point at a PostgreSQL instance");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    DbClient::new(pool)
}

async fn create_user(db: &DbClient, role: UserRole) -> mindlift_backend::models::User {
    db.save_user(
        "Test User",
        &format!("{}@test.example", Uuid::new_v4()),
        "$argon2id$not-a-real-hash",
        role,
        None,
        &Uuid::new_v4().to_string(),
        Utc::now() + Duration::hours(24),
    )
    .await
    .expect("create user")
}

fn owner_notification(user_id: Uuid) -> NewNotification {
    NewNotification {
        user_id,
        kind: NotificationKind::VideoApproved,
        title: "Your video is live".to_string(),
        message: "approved".to_string(),
        data: json!({}),
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn bookmark_insert_is_idempotent() {
    let db = client().await;
    let viewer = create_user(&db, UserRole::Subscriber).await;
    let speaker = create_user(&db, UserRole::Speaker).await;

    let video = db
        .save_video(
            &speaker.id,
            "Bookmark target",
            None,
            None,
            Some("https://videos.example.com/a.mp4"),
            None,
        )
        .await
        .unwrap();
    db.set_video_approval(
        &video.id,
        ApprovalStatus::Approved,
        None,
        owner_notification(speaker.id),
    )
    .await
    .unwrap();

    let first = db.save_bookmark(&viewer.id, &video.id).await.unwrap();
    let second = db.save_bookmark(&viewer.id, &video.id).await.unwrap();
    assert_eq!(first, 1);
    assert_eq!(second, 0, "duplicate bookmark must be a no-op");

    let bookmarked = db.list_bookmarked_videos(&viewer.id).await.unwrap();
    assert_eq!(
        bookmarked.iter().filter(|v| v.id == video.id).count(),
        1,
        "exactly one bookmark row per (user, video) pair"
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn public_listing_excludes_unapproved_videos() {
    let db = client().await;
    let speaker = create_user(&db, UserRole::Speaker).await;

    let pending = db
        .save_video(
            &speaker.id,
            "Still pending",
            None,
            Some("focus"),
            Some("https://videos.example.com/p.mp4"),
            None,
        )
        .await
        .unwrap();
    let approved = db
        .save_video(
            &speaker.id,
            "Already approved",
            None,
            Some("focus"),
            Some("https://videos.example.com/a.mp4"),
            None,
        )
        .await
        .unwrap();
    db.set_video_approval(
        &approved.id,
        ApprovalStatus::Approved,
        None,
        owner_notification(speaker.id),
    )
    .await
    .unwrap();

    let public = db.list_public_videos(None, 1000, 0).await.unwrap();
    assert!(public.iter().any(|v| v.id == approved.id));
    assert!(public.iter().all(|v| v.id != pending.id));
    assert!(public.iter().all(|v| v.status == ApprovalStatus::Approved));

    let queue = db.list_videos_by_status(ApprovalStatus::Pending).await.unwrap();
    assert!(queue.iter().any(|v| v.id == pending.id));
    assert!(queue.iter().all(|v| v.status == ApprovalStatus::Pending));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn approval_writes_video_and_notification_together() {
    let db = client().await;
    let speaker = create_user(&db, UserRole::Speaker).await;

    let video = db
        .save_video(
            &speaker.id,
            "Awaiting review",
            None,
            None,
            Some("https://videos.example.com/r.mp4"),
            None,
        )
        .await
        .unwrap();

    let updated = db
        .set_video_approval(
            &video.id,
            ApprovalStatus::Approved,
            Some("clean audio"),
            owner_notification(speaker.id),
        )
        .await
        .unwrap();
    assert_eq!(updated.status, ApprovalStatus::Approved);

    let notifications = db.list_notifications(&speaker.id).await.unwrap();
    assert!(notifications
        .iter()
        .any(|n| n.kind == NotificationKind::VideoApproved));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn rejection_persists_instead_of_deleting() {
    let db = client().await;
    let speaker = create_user(&db, UserRole::Speaker).await;

    let video = db
        .save_video(
            &speaker.id,
            "Not quite there",
            None,
            None,
            Some("https://videos.example.com/n.mp4"),
            None,
        )
        .await
        .unwrap();

    db.set_video_approval(
        &video.id,
        ApprovalStatus::Rejected,
        None,
        NewNotification {
            user_id: speaker.id,
            kind: NotificationKind::VideoRejected,
            title: "Your video was not approved".to_string(),
            message: "rejected".to_string(),
            data: json!({}),
        },
    )
    .await
    .unwrap();

    let reloaded = db.get_video(&video.id).await.unwrap();
    assert_eq!(
        reloaded.map(|v| v.status),
        Some(ApprovalStatus::Rejected),
        "rejected videos stay on record; only delete destroys content"
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn ensure_speaker_is_idempotent() {
    let db = client().await;
    let user = create_user(&db, UserRole::Speaker).await;

    let first = db.ensure_speaker(&user.id).await.unwrap();
    let second = db.ensure_speaker(&user.id).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.approval_status, ApprovalStatus::Pending);
    assert!(first.submitted_at.is_none());
}
