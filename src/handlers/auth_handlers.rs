use std::sync::Arc;

use axum::{
    extract::Query,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use chrono::{Duration, Utc};
use serde_json::json;
use validator::Validate;

use crate::{
    dtos::{
        FilterUserDto, ForgotPasswordRequestDto, LoginUserDto, RegisterUserDto,
        ResetPasswordRequestDto, Response, UserLoginResponseDto, VerifyEmailQueryDto,
    },
    error::{AppError, ErrorMessage},
    models::{NewNotification, NotificationKind, UserRole},
    utils::{password, token},
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/verify-email", get(verify_email))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

async fn signup(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    // Role comes from a closed allow-list; anything unknown is refused rather
    // than silently defaulted.
    let role = match body.role.as_deref() {
        None | Some("") => UserRole::Subscriber,
        Some(value) => UserRole::parse(value)
            .ok_or_else(|| AppError::bad_request(format!("Invalid role: {}", value)))?,
    };

    let verification_token = uuid::Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::hours(24);

    let hash_pwd = password::hash(&body.password).map_err(|e| AppError::bad_request(e.to_str()))?;

    let result = app_state
        .db_client
        .save_user(
            &body.name,
            &body.email.to_lowercase(),
            &hash_pwd,
            role,
            body.country.as_deref(),
            &verification_token,
            expires_at,
        )
        .await;

    match result {
        Ok(user) => {
            let notification = NewNotification {
                user_id: user.id,
                kind: NotificationKind::EmailVerification,
                title: "Verify your email".to_string(),
                message: format!(
                    "Welcome to MindLift, {}! Please verify your email address to unlock \
                     email notifications.",
                    user.name
                ),
                data: json!({}),
            };
            if let Err(e) = app_state.db_client.save_notification(notification).await {
                tracing::warn!(user_id = %user.id, error = %e, "could not record verification notification");
            }

            // The verification email goes out inline because the sweep only
            // mails verified recipients. Delivery failure never fails signup.
            let mailer = app_state.mailer.clone();
            let email = user.email.clone();
            let name = user.name.clone();
            tokio::spawn(async move {
                mailer
                    .send(
                        &email,
                        "Verify your MindLift email",
                        format!(
                            "Hi {},\n\nUse this token to verify your email address:\n\n{}\n",
                            name, verification_token
                        ),
                    )
                    .await;
            });

            let token = token::create_token(
                &user.id.to_string(),
                user.role.to_str(),
                app_state.env.jwt_secret.as_bytes(),
                app_state.env.jwt_maxage,
            )
            .map_err(|e| AppError::server_error(e.to_string()))?;

            Ok((
                StatusCode::CREATED,
                Json(UserLoginResponseDto {
                    status: "success".to_string(),
                    token,
                    user: FilterUserDto::filter_user(&user),
                }),
            ))
        }

        Err(sqlx::Error::Database(db_err)) => {
            if db_err.is_unique_violation() {
                Err(AppError::unique_constraint_violation(
                    ErrorMessage::EmailExist.to_str(),
                ))
            } else {
                tracing::error!(error = %db_err, "signup failed");
                Err(AppError::server_error(ErrorMessage::ServerError.to_str()))
            }
        }

        // Connectivity failures map to 503 here: a session token is never
        // fabricated while the credential store is unreachable.
        Err(e) => Err(AppError::from(e)),
    }
}

async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .get_user(None, Some(&body.email.to_lowercase()), None)
        .await?
        .ok_or_else(|| AppError::unauthorized(ErrorMessage::WrongCredentials.to_str()))?;

    let password_matched = password::compare(&body.password, &user.password)
        .map_err(|_| AppError::unauthorized(ErrorMessage::WrongCredentials.to_str()))?;

    if !password_matched {
        return Err(AppError::unauthorized(
            ErrorMessage::WrongCredentials.to_str(),
        ));
    }

    let token = token::create_token(
        &user.id.to_string(),
        user.role.to_str(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| AppError::server_error(e.to_string()))?;

    app_state.db_client.update_last_login(&user.id).await?;

    let cookie_duration = time::Duration::minutes(app_state.env.jwt_maxage);
    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .max_age(cookie_duration)
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| AppError::server_error(ErrorMessage::ServerError.to_str()))?,
    );

    let response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        token,
        user: FilterUserDto::filter_user(&user),
    });

    Ok((StatusCode::OK, headers, response))
}

async fn verify_email(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<VerifyEmailQueryDto>,
) -> Result<impl IntoResponse, AppError> {
    let user = app_state
        .db_client
        .get_user(None, None, Some(&query.token))
        .await?
        .ok_or_else(|| AppError::bad_request("Invalid or expired verification token"))?;

    let still_valid = user
        .token_expires_at
        .is_some_and(|expires_at| expires_at > Utc::now());
    if !still_valid {
        return Err(AppError::bad_request("Invalid or expired verification token"));
    }

    app_state.db_client.mark_email_verified(&user.id).await?;

    Ok(Json(Response {
        status: "success",
        message: "Email verified successfully".to_string(),
    }))
}

async fn forgot_password(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ForgotPasswordRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    // The response is identical whether or not the account exists.
    if let Some(user) = app_state
        .db_client
        .get_user(None, Some(&body.email.to_lowercase()), None)
        .await?
    {
        let reset_token = uuid::Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::minutes(30);
        app_state
            .db_client
            .set_verification_token(&user.id, &reset_token, expires_at)
            .await?;

        let mailer = app_state.mailer.clone();
        let email = user.email.clone();
        tokio::spawn(async move {
            mailer
                .send(
                    &email,
                    "Reset your MindLift password",
                    format!(
                        "Use this token to reset your password (valid for 30 minutes):\n\n{}\n",
                        reset_token
                    ),
                )
                .await;
        });
    }

    Ok(Json(Response {
        status: "success",
        message: "If that email is registered, a reset link has been sent".to_string(),
    }))
}

async fn reset_password(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ResetPasswordRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .get_user(None, None, Some(&body.token))
        .await?
        .ok_or_else(|| AppError::bad_request("Invalid or expired reset token"))?;

    let still_valid = user
        .token_expires_at
        .is_some_and(|expires_at| expires_at > Utc::now());
    if !still_valid {
        return Err(AppError::bad_request("Invalid or expired reset token"));
    }

    let hash_pwd =
        password::hash(&body.new_password).map_err(|e| AppError::bad_request(e.to_str()))?;
    app_state
        .db_client
        .update_password(&user.id, &hash_pwd)
        .await?;

    Ok(Json(Response {
        status: "success",
        message: "Password updated successfully".to_string(),
    }))
}
