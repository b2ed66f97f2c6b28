//! Campaign Management Module
//!
//! Campaign creation and updates, member management and character links. The
//! campaign router also mounts the campaign-scoped invite and table routes.

pub mod characters;
pub mod handlers;
pub mod members;
pub mod service;
pub mod types;

use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::api::AppState;
use crate::{invites, tabletop};

/// Create the campaign router with all endpoints (mounted at `/api/campaigns`)
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_campaigns).post(handlers::create_campaign),
        )
        .route(
            "/{id}",
            get(handlers::get_campaign).patch(handlers::update_campaign),
        )
        .route("/{id}/status", put(handlers::update_status))
        .route("/{id}/characters", post(handlers::add_character))
        // Member routes
        .route("/{id}/members", get(handlers::list_members))
        .route(
            "/{id}/members/{user_id}",
            patch(handlers::update_member_role).delete(handlers::revoke_member),
        )
        // Invite routes
        .route(
            "/{id}/invites",
            get(invites::handlers::list_invites).post(invites::handlers::create_invite),
        )
        // Table routes
        .route("/{id}/scenes", post(tabletop::handlers::create_scene))
        .route(
            "/{id}/scenes/{scene_id}/active",
            put(tabletop::handlers::set_active_scene),
        )
        .route("/{id}/maps", post(tabletop::handlers::create_map))
        .route(
            "/{id}/handouts",
            get(tabletop::handlers::list_handouts).post(tabletop::handlers::create_handout),
        )
}
