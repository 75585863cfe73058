use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::{
    error::{AppError, ErrorMessage},
    models::{User, UserRole},
    utils::token,
    AppState,
};

/// The verified caller, attached to request extensions by the guard for
/// downstream ownership checks.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
}

pub async fn require_auth(req: Request, next: Next) -> Result<Response, AppError> {
    auth_guard(
        req,
        next,
        &[UserRole::Subscriber, UserRole::Speaker, UserRole::Admin],
    )
    .await
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    auth_guard(req, next, &[UserRole::Admin]).await
}

pub async fn require_speaker(req: Request, next: Next) -> Result<Response, AppError> {
    auth_guard(req, next, &[UserRole::Speaker]).await
}

pub async fn require_speaker_or_admin(req: Request, next: Next) -> Result<Response, AppError> {
    auth_guard(req, next, &[UserRole::Speaker, UserRole::Admin]).await
}

/// Bookmarks belong to the audience side of the platform; admins have no
/// bookmark list.
pub async fn require_member(req: Request, next: Next) -> Result<Response, AppError> {
    auth_guard(req, next, &[UserRole::Subscriber, UserRole::Speaker]).await
}

/// Role-set gate in front of business logic: 401 for a missing or invalid
/// token, 403 for a valid token whose role is outside the allowed set. The
/// role claim is checked before the user row is loaded, so a wrong-role caller
/// is refused even when the store is down.
async fn auth_guard(
    mut req: Request,
    next: Next,
    allowed_roles: &[UserRole],
) -> Result<Response, AppError> {
    let app_state = req
        .extensions()
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::server_error(ErrorMessage::ServerError.to_str()))?;

    let token = extract_token(&req)
        .ok_or_else(|| AppError::unauthorized(ErrorMessage::TokenNotProvided.to_str()))?;

    let claims = token::decode_token(&token, app_state.env.jwt_secret.as_bytes())
        .map_err(|e| AppError::unauthorized(e.to_str()))?;

    let role = UserRole::parse(&claims.role)
        .ok_or_else(|| AppError::unauthorized(ErrorMessage::InvalidToken.to_str()))?;
    if !allowed_roles.contains(&role) {
        return Err(AppError::forbidden(ErrorMessage::PermissionDenied.to_str()));
    }

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::unauthorized(ErrorMessage::InvalidToken.to_str()))?;

    let user = app_state
        .db_client
        .get_user(Some(&user_id), None, None)
        .await?
        .ok_or_else(|| AppError::unauthorized(ErrorMessage::UserNoLongerExist.to_str()))?;

    req.extensions_mut().insert(AuthenticatedUser { user });
    Ok(next.run(req).await)
}

/// Bearer header first, `token` cookie as the fallback set at login.
fn extract_token(req: &Request) -> Option<String> {
    let from_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|value| value.to_string());

    if from_header.is_some() {
        return from_header;
    }

    CookieJar::from_headers(req.headers())
        .get("token")
        .map(|cookie| cookie.value().to_string())
}
