//! Domain Error Types
//!
//! Every campaign, invite and table operation returns `TabletopError`. The
//! variants keep "no such thing" and "not allowed" apart so handlers can map
//! them to distinct status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::permissions::PermissionError;

#[derive(Debug, thiserror::Error)]
pub enum TabletopError {
    /// Campaign, map, token, scene, member or invite is absent.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Caller has no membership row for the campaign.
    #[error("Not a member of this campaign")]
    NotCampaignMember,

    /// Membership exists but role or status is insufficient.
    #[error("Not permitted")]
    NotPermitted,

    /// Unknown visibility, status or role value.
    #[error("Invalid value: {0}")]
    InvalidState(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    #[error("Invite has expired")]
    InviteExpired,

    #[error("Invite has already been redeemed")]
    InviteRedeemed,

    #[error("Already a member of this campaign")]
    AlreadyMember,

    #[error("Could not generate a unique invite code after {0} attempts")]
    CouldNotGenerateCode(u32),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for domain operations.
pub type TabletopResult<T> = Result<T, TabletopError>;

impl From<PermissionError> for TabletopError {
    fn from(err: PermissionError) -> Self {
        match err {
            PermissionError::NotCampaignMember => Self::NotCampaignMember,
            PermissionError::NotPermitted => Self::NotPermitted,
        }
    }
}

impl From<validator::ValidationErrors> for TabletopError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Error response body for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

impl TabletopError {
    /// Status code and machine-readable code for this error.
    pub const fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::NotCampaignMember => (StatusCode::NOT_FOUND, "NOT_CAMPAIGN_MEMBER"),
            Self::NotPermitted => (StatusCode::FORBIDDEN, "NOT_PERMITTED"),
            Self::InvalidState(_) => (StatusCode::BAD_REQUEST, "INVALID_STATE"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::AlreadyExists(_) => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
            Self::InviteExpired => (StatusCode::GONE, "INVITE_EXPIRED"),
            Self::InviteRedeemed => (StatusCode::CONFLICT, "INVITE_REDEEMED"),
            Self::AlreadyMember => (StatusCode::CONFLICT, "ALREADY_MEMBER"),
            Self::CouldNotGenerateCode(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "COULD_NOT_GENERATE_CODE")
            }
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for TabletopError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Database(err) => {
                tracing::error!(%err, "Database error");
                "Internal server error".to_string()
            }
            Self::CouldNotGenerateCode(attempts) => {
                tracing::error!(attempts, "Invite code space exhausted");
                self.to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse { error: code, message })).into_response()
    }
}

/// Whether a store error is a unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
