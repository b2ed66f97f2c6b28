//! Table Content
//!
//! Scenes, maps and tokens. Every write resolves the owning campaign first and
//! requires `ManageContent` there.

use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use super::types::{GameMap, Scene, Token, DEFAULT_SCENE_NAME};
use crate::error::{TabletopError, TabletopResult};
use crate::permissions::{require_campaign_action, CampaignAction};

pub(crate) const SCENE_COLUMNS: &str = "id, campaign_id, name, is_active, created_at";
pub(crate) const MAP_COLUMNS: &str =
    "id, scene_id, name, grid_width, grid_height, background_url, created_at";
pub(crate) const TOKEN_COLUMNS: &str =
    "id, map_id, name, x, y, size_squares, audience, image_url, created_at, updated_at";

/// Token fields supplied by the caller.
#[derive(Debug, Clone)]
pub struct NewToken<'a> {
    pub name: &'a str,
    pub x: i32,
    pub y: i32,
    pub size_squares: i32,
    pub audience: &'a [String],
    pub image_url: Option<&'a str>,
}

// ============================================================================
// Ownership Resolution
// ============================================================================

/// Campaign that owns a map, via its scene.
pub async fn campaign_of_map<'e, E>(executor: E, map_id: Uuid) -> TabletopResult<Uuid>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar(
        r"SELECT s.campaign_id FROM maps m
           INNER JOIN scenes s ON s.id = m.scene_id
           WHERE m.id = $1",
    )
    .bind(map_id)
    .fetch_optional(executor)
    .await?
    .ok_or(TabletopError::NotFound("Map"))
}

/// Campaign that owns a token, via map and scene.
pub async fn campaign_of_token<'e, E>(executor: E, token_id: Uuid) -> TabletopResult<Uuid>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar(
        r"SELECT s.campaign_id FROM tokens t
           INNER JOIN maps m ON m.id = t.map_id
           INNER JOIN scenes s ON s.id = m.scene_id
           WHERE t.id = $1",
    )
    .bind(token_id)
    .fetch_optional(executor)
    .await?
    .ok_or(TabletopError::NotFound("Token"))
}

// ============================================================================
// Scenes
// ============================================================================

async fn insert_scene(
    conn: &mut PgConnection,
    campaign_id: Uuid,
    name: &str,
) -> sqlx::Result<Scene> {
    sqlx::query_as::<_, Scene>(&format!(
        r"INSERT INTO scenes (id, campaign_id, name)
           VALUES ($1, $2, $3)
           RETURNING {SCENE_COLUMNS}"
    ))
    .bind(Uuid::now_v7())
    .bind(campaign_id)
    .bind(name)
    .fetch_one(conn)
    .await
}

/// Make `scene_id` the only active scene of its campaign.
async fn activate_scene(
    conn: &mut PgConnection,
    campaign_id: Uuid,
    scene_id: Uuid,
) -> sqlx::Result<Scene> {
    sqlx::query("UPDATE scenes SET is_active = FALSE WHERE campaign_id = $1 AND is_active AND id <> $2")
        .bind(campaign_id)
        .bind(scene_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("UPDATE campaigns SET active_scene_id = $2, updated_at = NOW() WHERE id = $1")
        .bind(campaign_id)
        .bind(scene_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query_as::<_, Scene>(&format!(
        "UPDATE scenes SET is_active = TRUE WHERE id = $1 RETURNING {SCENE_COLUMNS}"
    ))
    .bind(scene_id)
    .fetch_one(&mut *conn)
    .await
}

/// Lock the campaign row and return its active scene.
async fn lock_active_scene(conn: &mut PgConnection, campaign_id: Uuid) -> TabletopResult<Option<Uuid>> {
    let active: Option<Option<Uuid>> =
        sqlx::query_scalar("SELECT active_scene_id FROM campaigns WHERE id = $1 FOR UPDATE")
            .bind(campaign_id)
            .fetch_optional(conn)
            .await?;

    active.ok_or(TabletopError::NotFound("Campaign"))
}

/// Create a scene. The first scene of a campaign becomes its active scene.
#[tracing::instrument(skip(pool))]
pub async fn create_scene(
    pool: &PgPool,
    campaign_id: Uuid,
    user_id: Uuid,
    name: &str,
) -> TabletopResult<Scene> {
    require_campaign_action(pool, campaign_id, user_id, CampaignAction::ManageContent).await?;

    let mut tx = pool.begin().await?;

    let active = lock_active_scene(&mut tx, campaign_id).await?;
    let mut scene = insert_scene(&mut tx, campaign_id, name.trim()).await?;
    if active.is_none() {
        scene = activate_scene(&mut tx, campaign_id, scene.id).await?;
    }

    tx.commit().await?;

    tracing::info!(%campaign_id, scene_id = %scene.id, active = scene.is_active, "Scene created");
    Ok(scene)
}

/// Switch the campaign's active scene.
#[tracing::instrument(skip(pool))]
pub async fn set_active_scene(
    pool: &PgPool,
    campaign_id: Uuid,
    user_id: Uuid,
    scene_id: Uuid,
) -> TabletopResult<Scene> {
    require_campaign_action(pool, campaign_id, user_id, CampaignAction::ManageContent).await?;

    let mut tx = pool.begin().await?;

    lock_active_scene(&mut tx, campaign_id).await?;

    let belongs: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM scenes WHERE id = $1 AND campaign_id = $2)",
    )
    .bind(scene_id)
    .bind(campaign_id)
    .fetch_one(&mut *tx)
    .await?;
    if !belongs {
        return Err(TabletopError::NotFound("Scene"));
    }

    let scene = activate_scene(&mut tx, campaign_id, scene_id).await?;
    tx.commit().await?;

    tracing::info!(%campaign_id, %scene_id, %user_id, "Active scene changed");
    Ok(scene)
}

// ============================================================================
// Maps
// ============================================================================

/// Create a map.
///
/// Without an explicit scene the map goes into the active scene. A campaign
/// with no scene at all gets a default one, created and activated in the same
/// transaction.
#[tracing::instrument(skip(pool))]
pub async fn create_map(
    pool: &PgPool,
    campaign_id: Uuid,
    user_id: Uuid,
    scene_id: Option<Uuid>,
    name: &str,
    grid_width: i32,
    grid_height: i32,
    background_url: Option<&str>,
) -> TabletopResult<GameMap> {
    if grid_width < 1 || grid_height < 1 {
        return Err(TabletopError::Validation(
            "Grid dimensions must be positive".into(),
        ));
    }

    require_campaign_action(pool, campaign_id, user_id, CampaignAction::ManageContent).await?;

    let mut tx = pool.begin().await?;

    let active = lock_active_scene(&mut tx, campaign_id).await?;

    let scene_id = match (scene_id, active) {
        (Some(requested), _) => {
            let belongs: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM scenes WHERE id = $1 AND campaign_id = $2)",
            )
            .bind(requested)
            .bind(campaign_id)
            .fetch_one(&mut *tx)
            .await?;
            if !belongs {
                return Err(TabletopError::NotFound("Scene"));
            }
            requested
        }
        (None, Some(active)) => active,
        (None, None) => {
            let scene = insert_scene(&mut tx, campaign_id, DEFAULT_SCENE_NAME).await?;
            activate_scene(&mut tx, campaign_id, scene.id).await?;
            tracing::debug!(%campaign_id, scene_id = %scene.id, "Default scene created");
            scene.id
        }
    };

    let map = sqlx::query_as::<_, GameMap>(&format!(
        r"INSERT INTO maps (id, scene_id, name, grid_width, grid_height, background_url)
           VALUES ($1, $2, $3, $4, $5, $6)
           RETURNING {MAP_COLUMNS}"
    ))
    .bind(Uuid::now_v7())
    .bind(scene_id)
    .bind(name.trim())
    .bind(grid_width)
    .bind(grid_height)
    .bind(background_url)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(%campaign_id, %scene_id, map_id = %map.id, "Map created");
    Ok(map)
}

// ============================================================================
// Tokens
// ============================================================================

/// Place a token on a map.
#[tracing::instrument(skip(pool))]
pub async fn create_token(
    pool: &PgPool,
    map_id: Uuid,
    user_id: Uuid,
    token: NewToken<'_>,
) -> TabletopResult<Token> {
    if token.x < 0 || token.y < 0 {
        return Err(TabletopError::Validation(
            "Token position must not be negative".into(),
        ));
    }
    if token.size_squares < 1 {
        return Err(TabletopError::Validation(
            "Token size must be at least one square".into(),
        ));
    }

    let campaign_id = campaign_of_map(pool, map_id).await?;
    require_campaign_action(pool, campaign_id, user_id, CampaignAction::ManageContent).await?;

    let created = sqlx::query_as::<_, Token>(&format!(
        r"INSERT INTO tokens (id, map_id, name, x, y, size_squares, audience, image_url)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
           RETURNING {TOKEN_COLUMNS}"
    ))
    .bind(Uuid::now_v7())
    .bind(map_id)
    .bind(token.name.trim())
    .bind(token.x)
    .bind(token.y)
    .bind(token.size_squares)
    .bind(token.audience)
    .bind(token.image_url)
    .fetch_one(pool)
    .await?;

    tracing::info!(%campaign_id, %map_id, token_id = %created.id, "Token created");
    Ok(created)
}
