//! Invite Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::service;
use super::types::{CampaignInvite, CreateInviteRequest, InviteAcceptedResponse};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::TabletopError;

/// List active invites for a campaign (GMs only)
#[utoipa::path(
    get,
    path = "/api/campaigns/{id}/invites",
    tag = "invites",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    responses((status = 200, body = Vec<CampaignInvite>)),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn list_invites(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Vec<CampaignInvite>>, TabletopError> {
    let invites = service::list_invites(&state.db, campaign_id, auth.id).await?;
    Ok(Json(invites))
}

/// Create a new invite (GMs only)
#[utoipa::path(
    post,
    path = "/api/campaigns/{id}/invites",
    tag = "invites",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    request_body = CreateInviteRequest,
    responses(
        (status = 201, body = CampaignInvite),
        (status = 403, description = "Caller cannot manage members"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn create_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(campaign_id): Path<Uuid>,
    body: Option<Json<CreateInviteRequest>>,
) -> Result<(StatusCode, Json<CampaignInvite>), TabletopError> {
    let body = body.map(|Json(body)| body).unwrap_or_default();

    let invite = service::issue_invite(
        &state.db,
        state.codes.as_ref(),
        &state.config.invites,
        campaign_id,
        auth.id,
        body.role_default.as_deref(),
        body.expires_at,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(invite)))
}

/// Accept an invite code (any authenticated user)
#[utoipa::path(
    post,
    path = "/api/invites/{code}/accept",
    tag = "invites",
    params(("code" = String, Path, description = "Invite code")),
    responses(
        (status = 200, body = InviteAcceptedResponse),
        (status = 404, description = "Unknown code"),
        (status = 409, description = "Already redeemed or already a member"),
        (status = 410, description = "Invite expired"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn accept_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(code): Path<String>,
) -> Result<Json<InviteAcceptedResponse>, TabletopError> {
    let member = service::redeem_invite(&state.db, code.trim(), auth.id).await?;
    Ok(Json(member.into()))
}
