//! Campaign Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use super::types::{
    AddCharacterRequest, Campaign, CampaignCharacter, CampaignSummary, CreateCampaignRequest,
    MemberResponse, UpdateCampaignRequest, UpdateMemberRoleRequest, UpdateStatusRequest,
};
use super::{characters, members, service};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::TabletopError;
use crate::tabletop::types::CampaignSnapshot;
use crate::tabletop::get_full;

// ============================================================================
// Campaigns
// ============================================================================

/// List campaigns the caller belongs to
#[utoipa::path(
    get,
    path = "/api/campaigns",
    tag = "campaigns",
    responses((status = 200, body = Vec<CampaignSummary>)),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn list_campaigns(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<CampaignSummary>>, TabletopError> {
    let campaigns = service::list_campaigns(&state.db, auth.id).await?;
    Ok(Json(campaigns))
}

/// Create a new campaign owned by the caller
#[utoipa::path(
    post,
    path = "/api/campaigns",
    tag = "campaigns",
    request_body = CreateCampaignRequest,
    responses(
        (status = 201, body = Campaign),
        (status = 400, description = "Invalid visibility or status"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn create_campaign(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), TabletopError> {
    body.validate()?;

    let campaign = service::create_campaign(
        &state.db,
        auth.id,
        &body.name,
        body.description.as_deref(),
        body.visibility.as_deref(),
        body.status.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(campaign)))
}

/// Full role-filtered campaign snapshot
#[utoipa::path(
    get,
    path = "/api/campaigns/{id}",
    tag = "campaigns",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    responses(
        (status = 200, body = CampaignSnapshot),
        (status = 403, description = "Membership not accepted"),
        (status = 404, description = "Campaign not found or caller is not a member"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn get_campaign(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<CampaignSnapshot>, TabletopError> {
    let snapshot = get_full(&state.db, campaign_id, auth.id).await?;
    Ok(Json(snapshot))
}

/// Update campaign name, description or visibility
#[utoipa::path(
    patch,
    path = "/api/campaigns/{id}",
    tag = "campaigns",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    request_body = UpdateCampaignRequest,
    responses((status = 200, body = Campaign)),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn update_campaign(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<UpdateCampaignRequest>,
) -> Result<Json<Campaign>, TabletopError> {
    body.validate()?;

    let campaign = service::update_campaign(
        &state.db,
        campaign_id,
        auth.id,
        body.name.as_deref(),
        body.description.as_deref(),
        body.visibility.as_deref(),
    )
    .await?;

    Ok(Json(campaign))
}

/// Change the campaign lifecycle status
#[utoipa::path(
    put,
    path = "/api/campaigns/{id}/status",
    tag = "campaigns",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    request_body = UpdateStatusRequest,
    responses((status = 200, body = Campaign)),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Campaign>, TabletopError> {
    let campaign = service::update_status(&state.db, campaign_id, auth.id, &body.status).await?;
    Ok(Json(campaign))
}

/// Link one of the caller's characters to the campaign
#[utoipa::path(
    post,
    path = "/api/campaigns/{id}/characters",
    tag = "campaigns",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    request_body = AddCharacterRequest,
    responses(
        (status = 201, body = CampaignCharacter),
        (status = 409, description = "Character already linked"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn add_character(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<AddCharacterRequest>,
) -> Result<(StatusCode, Json<CampaignCharacter>), TabletopError> {
    let character =
        characters::add_character(&state.db, campaign_id, auth.id, body.character_id).await?;
    Ok((StatusCode::CREATED, Json(character)))
}

// ============================================================================
// Members
// ============================================================================

/// List campaign members
#[utoipa::path(
    get,
    path = "/api/campaigns/{id}/members",
    tag = "campaigns",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    responses((status = 200, body = Vec<MemberResponse>)),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Vec<MemberResponse>>, TabletopError> {
    let members = members::list_members(&state.db, campaign_id, auth.id).await?;
    Ok(Json(members.into_iter().map(Into::into).collect()))
}

/// Change a member's role
#[utoipa::path(
    patch,
    path = "/api/campaigns/{id}/members/{user_id}",
    tag = "campaigns",
    params(
        ("id" = Uuid, Path, description = "Campaign ID"),
        ("user_id" = Uuid, Path, description = "Member user ID"),
    ),
    request_body = UpdateMemberRoleRequest,
    responses((status = 200, body = MemberResponse)),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn update_member_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((campaign_id, user_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateMemberRoleRequest>,
) -> Result<Json<MemberResponse>, TabletopError> {
    let member =
        members::update_member_role(&state.db, campaign_id, auth.id, user_id, &body.role).await?;
    Ok(Json(member.into()))
}

/// Revoke a member. Owners cannot be revoked.
#[utoipa::path(
    delete,
    path = "/api/campaigns/{id}/members/{user_id}",
    tag = "campaigns",
    params(
        ("id" = Uuid, Path, description = "Campaign ID"),
        ("user_id" = Uuid, Path, description = "Member user ID"),
    ),
    responses((status = 200, body = MemberResponse)),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn revoke_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((campaign_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MemberResponse>, TabletopError> {
    let member = members::revoke_member(&state.db, campaign_id, auth.id, user_id).await?;
    Ok(Json(member.into()))
}
