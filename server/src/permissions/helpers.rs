//! Permission helper functions for services and handlers.
//!
//! Load the caller's membership and run it through the gate in one call.

use sqlx::PgPool;
use uuid::Uuid;

use super::resolver::{authorize, CampaignAction, PermissionError};
use crate::error::{TabletopError, TabletopResult};
use crate::membership::{self, Membership};

/// Resolve the caller's membership, distinguishing a missing campaign from a
/// missing membership row.
#[tracing::instrument(skip(pool))]
pub async fn load_membership(
    pool: &PgPool,
    campaign_id: Uuid,
    user_id: Uuid,
) -> TabletopResult<Membership> {
    if let Some(member) = membership::get_membership(pool, campaign_id, user_id).await? {
        return Ok(member);
    }

    let campaign_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM campaigns WHERE id = $1)")
            .bind(campaign_id)
            .fetch_one(pool)
            .await?;

    if campaign_exists {
        Err(PermissionError::NotCampaignMember.into())
    } else {
        Err(TabletopError::NotFound("Campaign"))
    }
}

/// Load the caller's membership and require that it allows `action`.
///
/// # Example
///
/// ```ignore
/// let member = require_campaign_action(&pool, campaign_id, user_id, CampaignAction::ManageContent).await?;
/// ```
#[tracing::instrument(skip(pool))]
pub async fn require_campaign_action(
    pool: &PgPool,
    campaign_id: Uuid,
    user_id: Uuid,
    action: CampaignAction,
) -> TabletopResult<Membership> {
    let member = load_membership(pool, campaign_id, user_id).await?;

    if !authorize(member.role, member.status, action) {
        tracing::debug!(
            %campaign_id,
            %user_id,
            role = %member.role,
            status = %member.status,
            ?action,
            "Campaign action denied"
        );
        return Err(PermissionError::NotPermitted.into());
    }

    Ok(member)
}
