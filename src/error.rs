use std::fmt;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::to_string(self).unwrap())
    }
}

#[derive(Debug, PartialEq)]
pub enum ErrorMessage {
    EmptyPassword,
    ExceededMaxPasswordLength(usize),
    InvalidHashFormat,
    HashingError,
    InvalidToken,
    ServerError,
    ServiceUnavailable,
    WrongCredentials,
    EmailExist,
    UserNoLongerExist,
    TokenNotProvided,
    PermissionDenied,
    UserNotAuthenticated,
    MissingContent,
    MissingReason,
    AlreadySubmitted,
}

impl ErrorMessage {
    pub fn to_str(&self) -> String {
        match self {
            ErrorMessage::ServerError => "Server Error. Please try again later".to_string(),
            ErrorMessage::ServiceUnavailable => {
                "Service temporarily unavailable. Please try again later".to_string()
            }
            ErrorMessage::WrongCredentials => "Email or password is wrong".to_string(),
            ErrorMessage::EmailExist => "User with this email already exists.".to_string(),
            ErrorMessage::UserNoLongerExist => {
                "User belonging to this token no longer exists".to_string()
            }
            ErrorMessage::EmptyPassword => "Password cannot be empty".to_string(),
            ErrorMessage::HashingError => "Error while hashing password".to_string(),
            ErrorMessage::InvalidHashFormat => "Invalid password hash format".to_string(),
            ErrorMessage::ExceededMaxPasswordLength(max_length) => {
                format!("Password must not be more than {} characters", max_length)
            }
            ErrorMessage::InvalidToken => "Authentication token is invalid or expired".to_string(),
            ErrorMessage::TokenNotProvided => {
                "You are not logged in, please provide a token".to_string()
            }
            ErrorMessage::PermissionDenied => {
                "You are not allowed to perform this action".to_string()
            }
            ErrorMessage::UserNotAuthenticated => {
                "Authentication required. Please log in.".to_string()
            }
            ErrorMessage::MissingContent => "Video file or URL is required".to_string(),
            ErrorMessage::MissingReason => "A rejection reason is required".to_string(),
            ErrorMessage::AlreadySubmitted => {
                "Profile has already been submitted for review".to_string()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub message: String,
    pub status: StatusCode,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpError: message: {}, status: {}",
            self.message, self.status
        )
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        AppError {
            message: message.into(),
            status,
        }
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        AppError {
            message: message.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError {
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError {
            message: message.into(),
            status: StatusCode::UNAUTHORIZED,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError {
            message: message.into(),
            status: StatusCode::FORBIDDEN,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError {
            message: message.into(),
            status: StatusCode::NOT_FOUND,
        }
    }

    pub fn unique_constraint_violation(message: impl Into<String>) -> Self {
        AppError {
            message: message.into(),
            status: StatusCode::CONFLICT,
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        AppError {
            message: message.into(),
            status: StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn incomplete_profile(missing: &[&str]) -> Self {
        AppError {
            message: format!(
                "Profile is incomplete. Missing required fields: {}",
                missing.join(", ")
            ),
            status: StatusCode::BAD_REQUEST,
        }
    }
}

/// Store errors reach clients in three shapes: connectivity problems become 503
/// (auth endpoints must fail closed rather than fabricate a session), a missing
/// row becomes 404, and everything else is logged and withheld as a generic 500.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Tls(_) => {
                tracing::error!(error = %err, "database unreachable");
                AppError::service_unavailable(ErrorMessage::ServiceUnavailable.to_str())
            }
            sqlx::Error::RowNotFound => AppError::not_found("Resource not found"),
            other => {
                tracing::error!(error = %other, "database error");
                AppError::server_error(ErrorMessage::ServerError.to_str())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            Json(ErrorResponse {
                status: "fail".to_string(),
                message: self.message.clone(),
            }),
        )
            .into_response()
    }
}
