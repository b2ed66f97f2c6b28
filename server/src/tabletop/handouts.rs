//! Handouts
//!
//! Text shared with the table. `gm-only` handouts are hidden from non-GM
//! readers the same way tokens are.

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::types::{is_visible, Handout};
use crate::error::{TabletopError, TabletopResult};
use crate::permissions::{authorize, require_campaign_action, CampaignAction};

const HANDOUT_COLUMNS: &str = "id, campaign_id, title, body, audience, created_by, created_at";

/// Every handout of a campaign, unfiltered.
pub(crate) async fn fetch_handouts<'e, E>(executor: E, campaign_id: Uuid) -> sqlx::Result<Vec<Handout>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Handout>(&format!(
        "SELECT {HANDOUT_COLUMNS} FROM handouts WHERE campaign_id = $1 ORDER BY created_at ASC"
    ))
    .bind(campaign_id)
    .fetch_all(executor)
    .await
}

#[tracing::instrument(skip(pool, body))]
pub async fn create_handout(
    pool: &PgPool,
    campaign_id: Uuid,
    user_id: Uuid,
    title: &str,
    body: &str,
    audience: &[String],
) -> TabletopResult<Handout> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TabletopError::Validation("Title is required".into()));
    }

    require_campaign_action(pool, campaign_id, user_id, CampaignAction::ManageContent).await?;

    let handout = sqlx::query_as::<_, Handout>(&format!(
        r"INSERT INTO handouts (id, campaign_id, title, body, audience, created_by)
           VALUES ($1, $2, $3, $4, $5, $6)
           RETURNING {HANDOUT_COLUMNS}"
    ))
    .bind(Uuid::now_v7())
    .bind(campaign_id)
    .bind(title)
    .bind(body)
    .bind(audience)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(%campaign_id, handout_id = %handout.id, "Handout created");
    Ok(handout)
}

/// Handouts visible to the caller.
#[tracing::instrument(skip(pool))]
pub async fn list_handouts(
    pool: &PgPool,
    campaign_id: Uuid,
    user_id: Uuid,
) -> TabletopResult<Vec<Handout>> {
    let caller =
        require_campaign_action(pool, campaign_id, user_id, CampaignAction::ViewAsPlayer).await?;
    let is_gm = authorize(caller.role, caller.status, CampaignAction::ViewAsGm);

    let handouts = fetch_handouts(pool, campaign_id)
        .await?
        .into_iter()
        .filter(|h| is_visible(&h.audience, is_gm))
        .collect();

    Ok(handouts)
}
