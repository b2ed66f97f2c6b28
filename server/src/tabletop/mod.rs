//! Tabletop State
//!
//! Scenes, maps, tokens and handouts, plus the role-filtered snapshot that
//! bundles them with the campaign.

pub mod aggregate;
pub mod content;
pub mod handlers;
pub mod handouts;
pub mod tokens;
pub mod types;

use axum::routing::{patch, post};
use axum::Router;

use crate::api::AppState;

pub use aggregate::get_full;
pub use tokens::move_token;

/// Create the map router (mounted at `/api/maps`)
pub fn maps_router() -> Router<AppState> {
    Router::new().route("/{map_id}/tokens", post(handlers::create_token))
}

/// Create the token router (mounted at `/api/tokens`)
pub fn tokens_router() -> Router<AppState> {
    Router::new().route("/{token_id}/position", patch(handlers::move_token))
}
