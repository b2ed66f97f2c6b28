//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for sending requests through the full axum router, plus
//! utilities for token minting, character seeding and cleanup.
//!
//! Requires a running `PostgreSQL`; see `Config::default_for_test`.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use sqlx::PgPool;
use tabletop_server::api::{create_router, AppState};
use tabletop_server::auth::jwt::Claims;
use tabletop_server::config::Config;
use tabletop_server::db;
use tabletop_server::invites::CodeGenerator;
use tower::ServiceExt;
use uuid::Uuid;

// ============================================================================
// Database
// ============================================================================

/// Connect a fresh, migrated pool for one test.
///
/// Each `#[tokio::test]` runs on its own runtime, so pools are not shared
/// across tests.
pub async fn test_pool() -> PgPool {
    let config = Config::default_for_test();
    let pool = db::create_pool(&config.database_url, config.database_max_connections)
        .await
        .expect("Failed to connect to test DB");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

// ============================================================================
// Cleanup
// ============================================================================

/// Deletes seeded campaigns and characters when dropped, even if the test
/// panics. Campaign rows cascade to members, invites and table state.
pub struct Seeded {
    pool: PgPool,
    campaigns: Vec<Uuid>,
    characters: Vec<Uuid>,
}

impl Seeded {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            campaigns: Vec::new(),
            characters: Vec::new(),
        }
    }

    pub fn campaign(&mut self, campaign_id: Uuid) {
        self.campaigns.push(campaign_id);
    }

    pub fn character(&mut self, character_id: Uuid) {
        self.characters.push(character_id);
    }
}

impl Drop for Seeded {
    fn drop(&mut self) {
        if self.campaigns.is_empty() && self.characters.is_empty() {
            return;
        }

        let pool = self.pool.clone();
        let campaigns = std::mem::take(&mut self.campaigns);
        let characters = std::mem::take(&mut self.characters);
        let handle = tokio::runtime::Handle::current();

        // Drop cannot await; run the deletes on a helper thread.
        std::thread::spawn(move || {
            handle.block_on(async move {
                let _ = sqlx::query("DELETE FROM campaigns WHERE id = ANY($1)")
                    .bind(&campaigns)
                    .execute(&pool)
                    .await;
                let _ = sqlx::query("DELETE FROM characters WHERE id = ANY($1)")
                    .bind(&characters)
                    .execute(&pool)
                    .await;
            });
        })
        .join()
        .expect("Cleanup thread panicked");
    }
}

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub config: Arc<Config>,
}

impl TestApp {
    /// Create a new test app with a fresh DB pool.
    pub async fn new() -> Self {
        let pool = test_pool().await;
        let config = Config::default_for_test();
        Self::from_state(AppState::new(pool, config))
    }

    /// Create a test app with a custom invite code source.
    pub async fn with_code_generator(codes: Arc<dyn CodeGenerator>) -> Self {
        let pool = test_pool().await;
        let config = Config::default_for_test();
        Self::from_state(AppState::new(pool, config).with_code_generator(codes))
    }

    fn from_state(state: AppState) -> Self {
        let pool = state.db.clone();
        let config = state.config.clone();
        Self {
            router: create_router(state),
            pool,
            config,
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// Send an authenticated JSON request.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user_id: Uuid,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let token = generate_access_token(&self.config, user_id);
        let builder = Self::request(method, uri).header("Authorization", format!("Bearer {token}"));
        let req = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.oneshot(req).await
    }

    /// Start tracking rows to delete after the test.
    pub fn seeded(&self) -> Seeded {
        Seeded::new(self.pool.clone())
    }

    /// Create a campaign over HTTP and return its ID.
    pub async fn create_campaign(&self, owner_id: Uuid, name: &str) -> Uuid {
        let resp = self
            .send(
                Method::POST,
                "/api/campaigns",
                owner_id,
                Some(serde_json::json!({ "name": name })),
            )
            .await;
        assert_eq!(resp.status(), 201, "Campaign creation should return 201");
        let json = body_to_json(resp).await;
        json["id"].as_str().unwrap().parse().unwrap()
    }
}

// ============================================================================
// Auth & data helpers
// ============================================================================

/// Generate an access token the way the identity service would.
pub fn generate_access_token(config: &Config, user_id: Uuid) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + Duration::minutes(15)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .expect("Failed to sign access token")
}

/// Insert a character owned by `owner_id` and return its ID.
pub async fn create_character(pool: &PgPool, owner_id: Uuid, name: &str) -> Uuid {
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO characters (id, owner_id, name) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(owner_id)
        .bind(name)
        .execute(pool)
        .await
        .expect("Failed to create character");
    id
}

/// Read a response body as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}
