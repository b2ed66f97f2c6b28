//! Campaign Characters
//!
//! Links characters owned by the caller to a campaign. Character sheets live
//! in an external service; only ownership is checked here.

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::types::CampaignCharacter;
use crate::error::{is_unique_violation, TabletopError, TabletopResult};
use crate::permissions::{require_campaign_action, CampaignAction};

/// Link one of the caller's characters to a campaign.
#[tracing::instrument(skip(pool))]
pub async fn add_character(
    pool: &PgPool,
    campaign_id: Uuid,
    user_id: Uuid,
    character_id: Uuid,
) -> TabletopResult<CampaignCharacter> {
    require_campaign_action(pool, campaign_id, user_id, CampaignAction::ViewAsPlayer).await?;

    let owner: Option<Uuid> = sqlx::query_scalar("SELECT owner_id FROM characters WHERE id = $1")
        .bind(character_id)
        .fetch_optional(pool)
        .await?;

    match owner {
        Some(owner_id) if owner_id == user_id => {}
        Some(_) => return Err(TabletopError::NotPermitted),
        None => return Err(TabletopError::NotFound("Character")),
    }

    let result = sqlx::query(
        "INSERT INTO campaign_characters (campaign_id, character_id, added_by) VALUES ($1, $2, $3)",
    )
    .bind(campaign_id)
    .bind(character_id)
    .bind(user_id)
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        Err(ref err) if is_unique_violation(err) => {
            return Err(TabletopError::AlreadyExists("Campaign character"));
        }
        Err(err) => return Err(TabletopError::Database(err)),
    }

    tracing::info!(%campaign_id, %character_id, %user_id, "Character added to campaign");

    list_user_characters(pool, campaign_id, user_id)
        .await?
        .into_iter()
        .find(|c| c.character_id == character_id)
        .ok_or(TabletopError::NotFound("Character"))
}

/// Characters linked to a campaign that belong to `user_id`.
pub async fn list_user_characters<'e, E>(
    executor: E,
    campaign_id: Uuid,
    user_id: Uuid,
) -> sqlx::Result<Vec<CampaignCharacter>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, CampaignCharacter>(
        r"SELECT ch.id AS character_id, ch.owner_id, ch.name, cc.added_at
           FROM campaign_characters cc
           INNER JOIN characters ch ON ch.id = cc.character_id
           WHERE cc.campaign_id = $1 AND ch.owner_id = $2
           ORDER BY cc.added_at ASC",
    )
    .bind(campaign_id)
    .bind(user_id)
    .fetch_all(executor)
    .await
}
