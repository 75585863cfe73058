use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use mindlift_backend::{
    config::Config, db::DbClient, mail, mail::Mailer, payments::StripeClient, AppState,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mindlift_backend=debug,tower_http=info")),
        )
        .init();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("connected to the database");
            pool
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to the database");
            std::process::exit(1);
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!(error = %e, "failed to run database migrations");
        std::process::exit(1);
    }

    let port = config.port;
    let app_state = Arc::new(AppState {
        mailer: Mailer::from_config(&config),
        stripe: StripeClient::new(config.stripe_secret_key.clone()),
        db_client: DbClient::new(pool),
        env: config,
    });

    tokio::spawn(mail::run_email_sweep(app_state.clone()));

    let app = mindlift_backend::create_router(app_state);

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, port, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(port, "MindLift backend listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
    }
}
