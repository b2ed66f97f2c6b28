//! Campaign Invites
//!
//! One-time codes granting a default role to whoever redeems them first.

pub mod codes;
pub mod handlers;
pub mod service;
pub mod types;

use axum::routing::post;
use axum::Router;

use crate::api::AppState;

pub use codes::{CodeGenerator, RandomCodeGenerator};

/// Create the invite accept router (mounted at `/api/invites`)
pub fn router() -> Router<AppState> {
    Router::new().route("/{code}/accept", post(handlers::accept_invite))
}
