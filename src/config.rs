/// Development-only signing secret, used exclusively when
/// `INSECURE_DEV_MODE=true`. A missing `JWT_SECRET` in any other mode is a
/// fatal startup error.
const DEV_JWT_SECRET: &str = "mindlift-dev-secret-do-not-use-in-production";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Session token lifetime in minutes.
    pub jwt_maxage: i64,
    pub port: u16,
    pub upload_dir: String,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub subscription_price_cents: i64,
    pub subscription_currency: String,
    pub insecure_dev_mode: bool,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let insecure_dev_mode = std::env::var("INSECURE_DEV_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if insecure_dev_mode => {
                tracing::warn!(
                    "JWT_SECRET is not set; falling back to the built-in development \
                     secret because INSECURE_DEV_MODE is enabled. Tokens signed with \
                     this secret are forgeable."
                );
                DEV_JWT_SECRET.to_string()
            }
            _ => panic!("JWT_SECRET must be set (or INSECURE_DEV_MODE=true for local development)"),
        };

        let jwt_maxage = std::env::var("JWT_MAXAGE")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60);

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8000);

        let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

        let smtp_port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(587);

        let subscription_price_cents = std::env::var("SUBSCRIPTION_PRICE_CENTS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(999);

        Config {
            database_url,
            jwt_secret,
            jwt_maxage,
            port,
            upload_dir,
            smtp_host: std::env::var("SMTP_HOST").ok(),
            smtp_port,
            smtp_username: std::env::var("SMTP_USERNAME").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            smtp_from: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| "MindLift <no-reply@mindlift.example>".to_string()),
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY").ok(),
            stripe_webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").ok(),
            subscription_price_cents,
            subscription_currency: std::env::var("SUBSCRIPTION_CURRENCY")
                .unwrap_or_else(|_| "usd".to_string()),
            insecure_dev_mode,
        }
    }
}
