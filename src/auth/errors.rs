//! Typed failures of the authentication operations.
//!
//! Clients branch on `code()`, never on the message text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("User already exists")]
    Conflict,

    /// Unknown user, wrong password and bad refresh tokens all land here.
    #[error("Invalid credentials")]
    InvalidCredential,

    #[error("Email address is not confirmed")]
    EmailNotConfirmed,

    #[error("Token has expired, request a new confirmation email")]
    TokenExpired,

    #[error("User not found")]
    NotFound,

    #[error("Email address is already confirmed")]
    AlreadyConfirmed,

    #[error("Email could not be delivered")]
    DeliveryFailed,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidInput(_) => "invalid_input",
            AuthError::Conflict => "conflict",
            AuthError::InvalidCredential => "invalid_credential",
            AuthError::EmailNotConfirmed => "email_not_confirmed",
            AuthError::TokenExpired => "token_expired",
            AuthError::NotFound => "not_found",
            AuthError::AlreadyConfirmed => "already_confirmed",
            AuthError::DeliveryFailed => "delivery_failed",
            AuthError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::Conflict => StatusCode::CONFLICT,
            AuthError::InvalidCredential => StatusCode::UNAUTHORIZED,
            AuthError::EmailNotConfirmed => StatusCode::FORBIDDEN,
            AuthError::TokenExpired => StatusCode::GONE,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::AlreadyConfirmed => StatusCode::CONFLICT,
            AuthError::DeliveryFailed => StatusCode::BAD_GATEWAY,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        AuthError::InvalidInput(msg.into())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorResponse {
            error: self.code(),
            message,
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
