//! Campaign Mutation Service
//!
//! Create, list and update campaigns. Creation writes the campaign and its
//! owner membership in one transaction.

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::types::{parse_or_default, Campaign, CampaignStatus, CampaignSummary, CampaignVisibility};
use crate::error::{TabletopError, TabletopResult};
use crate::membership::{self, MemberStatus, Role};
use crate::permissions::{require_campaign_action, CampaignAction};

const CAMPAIGN_COLUMNS: &str = "id, owner_id, name, description, visibility, status, \
                                active_scene_id, created_at, updated_at";

/// Fetch a campaign by id.
pub async fn get_campaign<'e, E>(executor: E, campaign_id: Uuid) -> sqlx::Result<Option<Campaign>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Campaign>(&format!(
        "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1"
    ))
    .bind(campaign_id)
    .fetch_optional(executor)
    .await
}

/// Create a campaign owned by `owner_id`.
///
/// Visibility defaults to `private` and status to `not_started`. The owner's
/// `owner`/`accepted` membership is inserted in the same transaction.
#[tracing::instrument(skip(pool))]
pub async fn create_campaign(
    pool: &PgPool,
    owner_id: Uuid,
    name: &str,
    description: Option<&str>,
    visibility: Option<&str>,
    status: Option<&str>,
) -> TabletopResult<Campaign> {
    let visibility: CampaignVisibility = parse_or_default(visibility)?;
    let status: CampaignStatus = parse_or_default(status)?;

    let name = name.trim();
    if name.is_empty() {
        return Err(TabletopError::Validation("Name is required".into()));
    }

    let mut tx = pool.begin().await?;

    let campaign = sqlx::query_as::<_, Campaign>(&format!(
        r"INSERT INTO campaigns (id, owner_id, name, description, visibility, status)
           VALUES ($1, $2, $3, $4, $5, $6)
           RETURNING {CAMPAIGN_COLUMNS}"
    ))
    .bind(Uuid::now_v7())
    .bind(owner_id)
    .bind(name)
    .bind(description)
    .bind(visibility)
    .bind(status)
    .fetch_one(&mut *tx)
    .await?;

    membership::insert_membership(
        &mut *tx,
        campaign.id,
        owner_id,
        Role::Owner,
        MemberStatus::Accepted,
        None,
    )
    .await?;

    tx.commit().await?;

    tracing::info!(campaign_id = %campaign.id, %owner_id, "Campaign created");
    Ok(campaign)
}

/// List campaigns where the caller holds an accepted membership, newest first.
#[tracing::instrument(skip(pool))]
pub async fn list_campaigns(pool: &PgPool, user_id: Uuid) -> TabletopResult<Vec<CampaignSummary>> {
    let campaigns = sqlx::query_as::<_, CampaignSummary>(
        r"SELECT c.id, c.owner_id, c.name, c.description, c.visibility, c.status,
                 c.active_scene_id, c.created_at, c.updated_at, m.role
           FROM campaigns c
           INNER JOIN campaign_members m ON m.campaign_id = c.id
           WHERE m.user_id = $1 AND m.status = 'accepted'
           ORDER BY c.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(campaigns)
}

/// Update name, description or visibility. Absent fields keep their value.
#[tracing::instrument(skip(pool))]
pub async fn update_campaign(
    pool: &PgPool,
    campaign_id: Uuid,
    user_id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
    visibility: Option<&str>,
) -> TabletopResult<Campaign> {
    require_campaign_action(pool, campaign_id, user_id, CampaignAction::EditCampaign).await?;

    let visibility = visibility
        .map(str::parse::<CampaignVisibility>)
        .transpose()?;
    let name = name.map(str::trim);
    if name.is_some_and(str::is_empty) {
        return Err(TabletopError::Validation("Name is required".into()));
    }

    let campaign = sqlx::query_as::<_, Campaign>(&format!(
        r"UPDATE campaigns
           SET name = COALESCE($2, name),
               description = COALESCE($3, description),
               visibility = COALESCE($4, visibility),
               updated_at = NOW()
           WHERE id = $1
           RETURNING {CAMPAIGN_COLUMNS}"
    ))
    .bind(campaign_id)
    .bind(name)
    .bind(description)
    .bind(visibility)
    .fetch_optional(pool)
    .await?
    .ok_or(TabletopError::NotFound("Campaign"))?;

    tracing::info!(%campaign_id, %user_id, "Campaign updated");
    Ok(campaign)
}

/// Move a campaign to a new lifecycle status.
#[tracing::instrument(skip(pool))]
pub async fn update_status(
    pool: &PgPool,
    campaign_id: Uuid,
    user_id: Uuid,
    status: &str,
) -> TabletopResult<Campaign> {
    require_campaign_action(pool, campaign_id, user_id, CampaignAction::EditCampaign).await?;

    let status: CampaignStatus = status.parse()?;

    let campaign = sqlx::query_as::<_, Campaign>(&format!(
        r"UPDATE campaigns SET status = $2, updated_at = NOW()
           WHERE id = $1
           RETURNING {CAMPAIGN_COLUMNS}"
    ))
    .bind(campaign_id)
    .bind(status)
    .fetch_optional(pool)
    .await?
    .ok_or(TabletopError::NotFound("Campaign"))?;

    tracing::info!(%campaign_id, %user_id, %status, "Campaign status changed");
    Ok(campaign)
}
