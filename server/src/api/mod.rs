//! API Router and Application State
//!
//! Central routing configuration and shared state.

use axum::{extract::State, middleware::from_fn_with_state, routing::get, Json, Router};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::{
    auth, campaigns,
    config::Config,
    invites::{self, CodeGenerator, RandomCodeGenerator},
    tabletop,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,
    /// Server configuration
    pub config: Arc<Config>,
    /// Invite code source
    pub codes: Arc<dyn CodeGenerator>,
}

impl AppState {
    /// Create new application state with random invite codes.
    #[must_use]
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
            codes: Arc::new(RandomCodeGenerator),
        }
    }

    /// Replace the invite code source.
    #[must_use]
    pub fn with_code_generator(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
        self.codes = codes;
        self
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Protected routes that require authentication
    let protected_routes = Router::new()
        .nest("/api/campaigns", campaigns::router())
        .nest("/api/invites", invites::router())
        .nest("/api/maps", tabletop::maps_router())
        .nest("/api/tokens", tabletop::tokens_router())
        .layer(from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // API documentation
        .route("/api/openapi.json", get(openapi_json))
        .merge(protected_routes)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Whether the database answered
    database: bool,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();
    Json(HealthResponse {
        status: "ok",
        database,
    })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// OpenAPI document for the campaign API.
#[derive(OpenApi)]
#[openapi(
    paths(
        campaigns::handlers::list_campaigns,
        campaigns::handlers::create_campaign,
        campaigns::handlers::get_campaign,
        campaigns::handlers::update_campaign,
        campaigns::handlers::update_status,
        campaigns::handlers::add_character,
        campaigns::handlers::list_members,
        campaigns::handlers::update_member_role,
        campaigns::handlers::revoke_member,
        invites::handlers::list_invites,
        invites::handlers::create_invite,
        invites::handlers::accept_invite,
        tabletop::handlers::create_scene,
        tabletop::handlers::set_active_scene,
        tabletop::handlers::create_map,
        tabletop::handlers::create_token,
        tabletop::handlers::move_token,
        tabletop::handlers::list_handouts,
        tabletop::handlers::create_handout,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "campaigns", description = "Campaigns and members"),
        (name = "invites", description = "Invite codes"),
        (name = "tabletop", description = "Scenes, maps, tokens and handouts"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
