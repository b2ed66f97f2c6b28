//! Member Management
//!
//! Role changes and revocation. The target's current membership is loaded
//! first so the owner-protection guard can inspect it.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{TabletopError, TabletopResult};
use crate::membership::{self, MemberStatus, Membership, Role};
use crate::permissions::{
    authorize, can_change_role, can_revoke, require_campaign_action, CampaignAction,
};

/// List members of a campaign.
///
/// GMs see every row, including revoked ones. Other members see accepted
/// members only.
#[tracing::instrument(skip(pool))]
pub async fn list_members(
    pool: &PgPool,
    campaign_id: Uuid,
    user_id: Uuid,
) -> TabletopResult<Vec<Membership>> {
    let caller =
        require_campaign_action(pool, campaign_id, user_id, CampaignAction::ViewAsPlayer).await?;
    let is_gm = authorize(caller.role, caller.status, CampaignAction::ViewAsGm);

    let members = membership::list_memberships(pool, campaign_id)
        .await?
        .into_iter()
        .filter(|m| is_gm || m.status == MemberStatus::Accepted)
        .collect();

    Ok(members)
}

/// Change a member's role.
///
/// The target row is locked for the whole check-and-write so a concurrent
/// revocation cannot interleave with a promotion to owner.
#[tracing::instrument(skip(pool))]
pub async fn update_member_role(
    pool: &PgPool,
    campaign_id: Uuid,
    actor_id: Uuid,
    target_id: Uuid,
    role: &str,
) -> TabletopResult<Membership> {
    let actor =
        require_campaign_action(pool, campaign_id, actor_id, CampaignAction::ManageMembers)
            .await?;

    let new_role: Role = role.parse()?;

    let mut tx = pool.begin().await?;

    let target = membership::lock_membership(&mut tx, campaign_id, target_id)
        .await?
        .ok_or(TabletopError::NotFound("Member"))?;

    can_change_role(
        actor_id,
        actor.role,
        target_id,
        target.role,
        target.status,
        new_role,
    )?;

    membership::set_role(&mut *tx, campaign_id, target_id, new_role).await?;
    let updated = membership::get_membership(&mut *tx, campaign_id, target_id)
        .await?
        .ok_or(TabletopError::NotFound("Member"))?;

    tx.commit().await?;

    tracing::info!(
        %campaign_id,
        %actor_id,
        %target_id,
        from = %target.role,
        to = %new_role,
        "Member role changed"
    );

    Ok(updated)
}

/// Revoke a member.
///
/// Owners are never revocable. Revoking an already revoked member re-applies
/// the same write and succeeds.
#[tracing::instrument(skip(pool))]
pub async fn revoke_member(
    pool: &PgPool,
    campaign_id: Uuid,
    actor_id: Uuid,
    target_id: Uuid,
) -> TabletopResult<Membership> {
    require_campaign_action(pool, campaign_id, actor_id, CampaignAction::ManageMembers).await?;

    let mut tx = pool.begin().await?;

    let target = membership::lock_membership(&mut tx, campaign_id, target_id)
        .await?
        .ok_or(TabletopError::NotFound("Member"))?;

    can_revoke(target.role)?;

    membership::set_status(&mut *tx, campaign_id, target_id, MemberStatus::Revoked).await?;
    let updated = membership::get_membership(&mut *tx, campaign_id, target_id)
        .await?
        .ok_or(TabletopError::NotFound("Member"))?;

    tx.commit().await?;

    tracing::info!(%campaign_id, %actor_id, %target_id, "Member revoked");
    Ok(updated)
}
