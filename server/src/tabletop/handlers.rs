//! Table Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use super::content::{self, NewToken};
use super::types::{
    CreateHandoutRequest, CreateMapRequest, CreateSceneRequest, CreateTokenRequest, GameMap,
    Handout, MoveTokenRequest, Scene, Token,
};
use super::{handouts, tokens};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::TabletopError;

// ============================================================================
// Scenes and Maps
// ============================================================================

/// Create a scene (GMs only)
#[utoipa::path(
    post,
    path = "/api/campaigns/{id}/scenes",
    tag = "tabletop",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    request_body = CreateSceneRequest,
    responses((status = 201, body = Scene)),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn create_scene(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<CreateSceneRequest>,
) -> Result<(StatusCode, Json<Scene>), TabletopError> {
    body.validate()?;

    let scene = content::create_scene(&state.db, campaign_id, auth.id, &body.name).await?;
    Ok((StatusCode::CREATED, Json(scene)))
}

/// Make a scene the active one
#[utoipa::path(
    put,
    path = "/api/campaigns/{id}/scenes/{scene_id}/active",
    tag = "tabletop",
    params(
        ("id" = Uuid, Path, description = "Campaign ID"),
        ("scene_id" = Uuid, Path, description = "Scene ID"),
    ),
    responses((status = 200, body = Scene)),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn set_active_scene(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((campaign_id, scene_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Scene>, TabletopError> {
    let scene = content::set_active_scene(&state.db, campaign_id, auth.id, scene_id).await?;
    Ok(Json(scene))
}

/// Create a map, adding a default scene when the campaign has none
#[utoipa::path(
    post,
    path = "/api/campaigns/{id}/maps",
    tag = "tabletop",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    request_body = CreateMapRequest,
    responses((status = 201, body = GameMap)),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn create_map(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<CreateMapRequest>,
) -> Result<(StatusCode, Json<GameMap>), TabletopError> {
    body.validate()?;

    let map = content::create_map(
        &state.db,
        campaign_id,
        auth.id,
        body.scene_id,
        &body.name,
        body.grid_width,
        body.grid_height,
        body.background_url.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(map)))
}

// ============================================================================
// Tokens
// ============================================================================

/// Place a token on a map
#[utoipa::path(
    post,
    path = "/api/maps/{map_id}/tokens",
    tag = "tabletop",
    params(("map_id" = Uuid, Path, description = "Map ID")),
    request_body = CreateTokenRequest,
    responses((status = 201, body = Token)),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn create_token(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(map_id): Path<Uuid>,
    Json(body): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<Token>), TabletopError> {
    body.validate()?;

    let token = content::create_token(
        &state.db,
        map_id,
        auth.id,
        NewToken {
            name: &body.name,
            x: body.x,
            y: body.y,
            size_squares: body.size_squares.unwrap_or(1),
            audience: &body.audience,
            image_url: body.image_url.as_deref(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(token)))
}

/// Move a token. Concurrent moves are last-write-wins.
#[utoipa::path(
    patch,
    path = "/api/tokens/{token_id}/position",
    tag = "tabletop",
    params(("token_id" = Uuid, Path, description = "Token ID")),
    request_body = MoveTokenRequest,
    responses((status = 200, body = Token)),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn move_token(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(token_id): Path<Uuid>,
    Json(body): Json<MoveTokenRequest>,
) -> Result<Json<Token>, TabletopError> {
    body.validate()?;

    let token = tokens::move_token(&state.db, token_id, auth.id, body.x, body.y).await?;
    Ok(Json(token))
}

// ============================================================================
// Handouts
// ============================================================================

/// List handouts visible to the caller
#[utoipa::path(
    get,
    path = "/api/campaigns/{id}/handouts",
    tag = "tabletop",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    responses((status = 200, body = Vec<Handout>)),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn list_handouts(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Vec<Handout>>, TabletopError> {
    let handouts = handouts::list_handouts(&state.db, campaign_id, auth.id).await?;
    Ok(Json(handouts))
}

/// Create a handout (GMs only)
#[utoipa::path(
    post,
    path = "/api/campaigns/{id}/handouts",
    tag = "tabletop",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    request_body = CreateHandoutRequest,
    responses((status = 201, body = Handout)),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, body))]
pub async fn create_handout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<CreateHandoutRequest>,
) -> Result<(StatusCode, Json<Handout>), TabletopError> {
    body.validate()?;

    let handout = handouts::create_handout(
        &state.db,
        campaign_id,
        auth.id,
        &body.title,
        &body.body,
        &body.audience,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(handout)))
}
