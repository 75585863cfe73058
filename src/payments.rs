use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::error::AppError;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Seconds a webhook timestamp may lag before the event is refused as a
/// possible replay.
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub status: String,
}

/// Thin client over Stripe's payment-intent endpoint. Payments are an external
/// collaborator; only the interface contract lives here.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: Option<String>,
}

impl StripeClient {
    pub fn new(secret_key: Option<String>) -> StripeClient {
        StripeClient {
            http: reqwest::Client::new(),
            secret_key,
        }
    }

    pub async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        user_id: &Uuid,
    ) -> Result<PaymentIntent, AppError> {
        let secret_key = self
            .secret_key
            .as_deref()
            .ok_or_else(|| AppError::service_unavailable("Payments are not configured"))?;

        let amount = amount_cents.to_string();
        let user_id = user_id.to_string();
        let params = [
            ("amount", amount.as_str()),
            ("currency", currency),
            ("automatic_payment_methods[enabled]", "true"),
            ("metadata[user_id]", user_id.as_str()),
        ];

        let response = self
            .http
            .post(format!("{}/payment_intents", STRIPE_API_BASE))
            .bearer_auth(secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "stripe request failed");
                AppError::service_unavailable("Payment provider unreachable")
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "stripe rejected payment intent");
            return Err(AppError::server_error("Could not create payment intent"));
        }

        response.json::<PaymentIntent>().await.map_err(|e| {
            tracing::error!(error = %e, "unexpected stripe response shape");
            AppError::server_error("Could not create payment intent")
        })
    }
}

/// Verifies a `Stripe-Signature` header (`t=<ts>,v1=<hmac>`) against the raw
/// request body: HMAC-SHA256 over `"{t}.{payload}"` keyed with the endpoint
/// secret, with a replay-tolerance window on the timestamp.
pub fn verify_webhook_signature(
    payload: &[u8],
    signature_header: &str,
    endpoint_secret: &str,
) -> Result<(), AppError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| AppError::bad_request("Malformed webhook signature"))?;
    if signatures.is_empty() {
        return Err(AppError::bad_request("Malformed webhook signature"));
    }

    if (Utc::now().timestamp() - timestamp).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err(AppError::bad_request("Webhook timestamp outside tolerance"));
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(endpoint_secret.as_bytes())
        .map_err(|_| AppError::server_error("Invalid webhook secret"))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    if signatures.iter().any(|candidate| *candidate == expected) {
        Ok(())
    } else {
        Err(AppError::bad_request("Webhook signature mismatch"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    fn sign(payload: &[u8], timestamp: i64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_is_accepted() {
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let ts = Utc::now().timestamp();
        let header = format!("t={},v1={}", ts, sign(payload, ts));
        assert!(verify_webhook_signature(payload, &header, SECRET).is_ok());
    }

    #[test]
    fn tampered_payload_is_refused() {
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let ts = Utc::now().timestamp();
        let header = format!("t={},v1={}", ts, sign(payload, ts));
        assert!(verify_webhook_signature(b"{}", &header, SECRET).is_err());
    }

    #[test]
    fn stale_timestamp_is_refused() {
        let payload = b"{}";
        let ts = Utc::now().timestamp() - WEBHOOK_TOLERANCE_SECS - 10;
        let header = format!("t={},v1={}", ts, sign(payload, ts));
        assert!(verify_webhook_signature(payload, &header, SECRET).is_err());
    }

    #[test]
    fn header_without_v1_entry_is_refused() {
        let header = format!("t={}", Utc::now().timestamp());
        assert!(verify_webhook_signature(b"{}", &header, SECRET).is_err());
    }
}
