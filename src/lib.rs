use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod utils;
pub mod ws;

use crate::{config::Config, db::DbClient, mail::Mailer, payments::StripeClient};

pub struct AppState {
    pub env: Config,
    pub db_client: DbClient,
    pub mailer: Mailer,
    pub stripe: StripeClient,
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .merge(handlers::auth_handlers::auth_handler())
        .merge(handlers::user_handlers::user_handler())
        .merge(handlers::payment_handlers::payment_handler())
        .nest("/videos", handlers::video_handlers::video_handler())
        .nest("/speaker", handlers::speaker_handlers::speaker_handler())
        .nest("/admin", handlers::admin_handlers::admin_handler())
        .nest("/bookmarks", handlers::bookmark_handlers::bookmark_handler())
        .nest(
            "/notifications",
            handlers::notification_handlers::notification_handler(),
        );

    Router::new()
        // WebSocket push channel lives at the root, authenticated by a
        // `token` query parameter at handshake time.
        .route("/", get(ws::ws_handler))
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(&app_state.env.upload_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(app_state))
}
