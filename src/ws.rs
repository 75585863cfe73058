use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        FromRequestParts, Query, Request,
    },
    response::{IntoResponse, Response},
    Extension,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::{AppError, ErrorMessage},
    utils::token,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct WsQueryDto {
    pub token: Option<String>,
}

/// Push-channel handshake. The token travels as a query parameter because
/// browser WebSocket clients cannot set headers; it is verified before the
/// upgrade is even looked at, so an unauthenticated client is refused with
/// 401 and never connected.
pub async fn ws_handler(
    Query(query): Query<WsQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
    req: Request,
) -> Result<Response, AppError> {
    let token = query
        .token
        .ok_or_else(|| AppError::unauthorized(ErrorMessage::TokenNotProvided.to_str()))?;

    let claims = token::decode_token(&token, app_state.env.jwt_secret.as_bytes())
        .map_err(|e| AppError::unauthorized(e.to_str()))?;

    let (mut parts, _body) = req.into_parts();
    match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
        Ok(ws) => Ok(ws
            .on_upgrade(move |socket| handle_socket(socket, claims.sub))
            .into_response()),
        Err(rejection) => Ok(rejection.into_response()),
    }
}

/// Echo loop. Clients keep the connection open for server pushes; anything
/// they send comes straight back.
async fn handle_socket(mut socket: WebSocket, user_id: String) {
    tracing::debug!(user_id = %user_id, "websocket connected");

    let greeting = json!({"type": "connected"}).to_string();
    if socket.send(Message::Text(greeting.into())).await.is_err() {
        return;
    }

    while let Some(Ok(message)) = socket.recv().await {
        match message {
            Message::Text(text) => {
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    tracing::debug!(user_id = %user_id, "websocket disconnected");
}
