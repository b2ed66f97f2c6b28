//! Table State Type Definitions
//!
//! Campaign -> scenes -> maps -> tokens. Rows only reference their parent by
//! id; snapshots are assembled top-down from flat lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::campaigns::types::{Campaign, CampaignCharacter, MemberResponse};
use crate::membership::Role;

/// Audience tag hiding an item from non-GM readers.
pub const GM_ONLY: &str = "gm-only";

/// Name of the scene created when a map is added to a campaign without scenes.
pub const DEFAULT_SCENE_NAME: &str = "Table";

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, utoipa::ToSchema)]
pub struct Scene {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, utoipa::ToSchema)]
pub struct GameMap {
    pub id: Uuid,
    pub scene_id: Uuid,
    pub name: String,
    pub grid_width: i32,
    pub grid_height: i32,
    pub background_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Token placed on a map. Position and size are in grid squares.
#[derive(Debug, Clone, FromRow, Serialize, utoipa::ToSchema)]
pub struct Token {
    pub id: Uuid,
    pub map_id: Uuid,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub size_squares: i32,
    pub audience: Vec<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, utoipa::ToSchema)]
pub struct Handout {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub title: String,
    pub body: String,
    pub audience: Vec<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Whether an item tagged with `audience` is visible to the reader.
#[must_use]
pub fn is_visible(audience: &[String], is_gm: bool) -> bool {
    is_gm || !audience.iter().any(|tag| tag == GM_ONLY)
}

// ============================================================================
// Snapshot
// ============================================================================

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct MapView {
    #[serde(flatten)]
    pub map: GameMap,
    pub tokens: Vec<Token>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SceneView {
    #[serde(flatten)]
    pub scene: Scene,
    pub maps: Vec<MapView>,
}

/// Role-filtered view of a campaign returned by `GET /api/campaigns/{id}`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CampaignSnapshot {
    pub campaign: Campaign,
    /// Role of the caller the snapshot was filtered for.
    pub role: Role,
    pub members: Vec<MemberResponse>,
    /// The caller's own characters linked to this campaign.
    pub characters: Vec<CampaignCharacter>,
    pub handouts: Vec<Handout>,
    pub scenes: Vec<SceneView>,
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateSceneRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateMapRequest {
    /// Scene to place the map in. Defaults to the active scene.
    pub scene_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(range(min = 1, max = 1000, message = "Grid width must be 1-1000"))]
    pub grid_width: i32,
    #[validate(range(min = 1, max = 1000, message = "Grid height must be 1-1000"))]
    pub grid_height: i32,
    pub background_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateTokenRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(range(min = 0, message = "x must not be negative"))]
    pub x: i32,
    #[validate(range(min = 0, message = "y must not be negative"))]
    pub y: i32,
    #[validate(range(min = 1, max = 100, message = "Size must be 1-100 squares"))]
    pub size_squares: Option<i32>,
    #[serde(default)]
    pub audience: Vec<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct MoveTokenRequest {
    #[validate(range(min = 0, message = "x must not be negative"))]
    pub x: i32,
    #[validate(range(min = 0, message = "y must not be negative"))]
    pub y: i32,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateHandoutRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub audience: Vec<String>,
}
