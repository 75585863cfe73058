use std::sync::Arc;

use axum::{
    body::Bytes,
    http::HeaderMap,
    middleware,
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    dtos::PaymentIntentResponseDto,
    error::AppError,
    middleware::{require_auth, AuthenticatedUser},
    payments,
    AppState,
};

pub fn payment_handler() -> Router {
    Router::new()
        .route(
            "/subscribe",
            post(subscribe).route_layer(middleware::from_fn(require_auth)),
        )
        .route("/webhook", post(webhook))
}

/// Creates a payment intent for the subscription price and hands the client
/// secret back for the frontend to confirm. The paid flag is only flipped by
/// the signed webhook, never here.
async fn subscribe(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    let intent = app_state
        .stripe
        .create_payment_intent(
            app_state.env.subscription_price_cents,
            &app_state.env.subscription_currency,
            &auth.user.id,
        )
        .await?;

    tracing::info!(user_id = %auth.user.id, intent_id = %intent.id, "payment intent created");

    Ok(Json(PaymentIntentResponseDto {
        status: "success",
        client_secret: intent.client_secret,
    }))
}

/// Stripe calls back here with a signed payload. Signature verification gates
/// everything; a succeeded payment intent marks the referenced user as paid.
async fn webhook(
    Extension(app_state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let endpoint_secret = app_state
        .env
        .stripe_webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::service_unavailable("Payments are not configured"))?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::bad_request("Missing Stripe-Signature header"))?;

    payments::verify_webhook_signature(&body, signature, endpoint_secret)?;

    let event: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::bad_request("Malformed webhook payload"))?;

    if event["type"] == "payment_intent.succeeded" {
        let user_id = event["data"]["object"]["metadata"]["user_id"]
            .as_str()
            .and_then(|raw| Uuid::parse_str(raw).ok());

        match user_id {
            Some(user_id) => {
                let updated = app_state.db_client.set_user_paid(&user_id).await?;
                if updated == 0 {
                    tracing::warn!(%user_id, "paid webhook for unknown user");
                } else {
                    tracing::info!(%user_id, "subscription payment recorded");
                }
            }
            None => tracing::warn!("payment_intent.succeeded without a user_id in metadata"),
        }
    }

    Ok(Json(json!({"received": true})))
}
