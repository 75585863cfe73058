use std::sync::Arc;
use std::time::Duration;

use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{config::Config, AppState};

const SWEEP_INTERVAL: Duration = Duration::from_secs(30);
const SWEEP_BATCH_SIZE: i64 = 50;

/// SMTP mailer. When no SMTP host is configured the mailer is disabled and
/// every send is a logged no-op, which keeps local development working without
/// a mail relay.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl Mailer {
    pub fn from_config(config: &Config) -> Mailer {
        let transport = config.smtp_host.as_deref().and_then(|host| {
            let builder = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host) {
                Ok(builder) => builder.port(config.smtp_port),
                Err(e) => {
                    tracing::error!(error = %e, "invalid SMTP configuration, mail disabled");
                    return None;
                }
            };

            let builder = match (&config.smtp_username, &config.smtp_password) {
                (Some(username), Some(password)) => {
                    builder.credentials(Credentials::new(username.clone(), password.clone()))
                }
                _ => builder,
            };

            Some(builder.build())
        });

        if transport.is_none() {
            tracing::warn!("SMTP_HOST not configured, outgoing email is disabled");
        }

        Mailer {
            transport,
            from: config.smtp_from.clone(),
        }
    }

    /// Fire-and-forget delivery: failures are logged and reported through the
    /// return value, never propagated to the caller's request.
    pub async fn send(&self, to: &str, subject: &str, body: String) -> bool {
        let Some(transport) = &self.transport else {
            tracing::debug!(to, subject, "mail disabled, skipping send");
            return false;
        };

        let message = Message::builder()
            .from(match self.from.parse() {
                Ok(mailbox) => mailbox,
                Err(e) => {
                    tracing::error!(error = %e, "invalid sender address");
                    return false;
                }
            })
            .to(match to.parse() {
                Ok(mailbox) => mailbox,
                Err(e) => {
                    tracing::warn!(to, error = %e, "invalid recipient address");
                    return false;
                }
            })
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body);

        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(error = %e, "failed to build email");
                return false;
            }
        };

        match transport.send(message).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(to, subject, error = %e, "email delivery failed");
                false
            }
        }
    }
}

/// Background loop decoupling email delivery from lifecycle transitions:
/// picks up notifications not yet emailed whose recipient is verified, and
/// marks them sent on success. A failed delivery is retried on the next pass.
pub async fn run_email_sweep(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        interval.tick().await;

        let batch = match state
            .db_client
            .unsent_email_notifications(SWEEP_BATCH_SIZE)
            .await
        {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(error = %e, "email sweep could not query notifications");
                continue;
            }
        };

        for job in batch {
            if !state
                .mailer
                .send(&job.email, &job.title, job.message.clone())
                .await
            {
                continue;
            }
            if let Err(e) = state.db_client.mark_email_sent(&job.notification_id).await {
                tracing::warn!(
                    notification_id = %job.notification_id,
                    error = %e,
                    "sent email but could not mark notification"
                );
            }
        }
    }
}
