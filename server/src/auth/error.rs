//! Authentication Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::error::ErrorResponse;

/// Reasons a request fails the authentication boundary. All map to 401.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingAuthHeader,

    /// Header present but not `Bearer <token>`.
    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    /// Bad signature, malformed claims or a non-UUID subject.
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,
}

impl AuthError {
    const fn code(&self) -> &'static str {
        match self {
            Self::MissingAuthHeader => "MISSING_AUTH",
            Self::InvalidAuthHeader => "INVALID_AUTH_HEADER",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::debug!(reason = %self, "Request rejected at auth boundary");

        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
