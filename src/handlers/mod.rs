pub mod admin_handlers;
pub mod auth_handlers;
pub mod bookmark_handlers;
pub mod notification_handlers;
pub mod payment_handlers;
pub mod speaker_handlers;
pub mod user_handlers;
pub mod video_handlers;
