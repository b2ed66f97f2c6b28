//! Token Movement
//!
//! Moves overwrite the stored position. There is no version check, so
//! concurrent moves resolve last-write-wins.

use sqlx::PgPool;
use uuid::Uuid;

use super::content::{campaign_of_token, TOKEN_COLUMNS};
use super::types::Token;
use crate::error::{TabletopError, TabletopResult};
use crate::permissions::{require_campaign_action, CampaignAction};

/// Move a token to `(x, y)` on its map.
#[tracing::instrument(skip(pool))]
pub async fn move_token(
    pool: &PgPool,
    token_id: Uuid,
    user_id: Uuid,
    x: i32,
    y: i32,
) -> TabletopResult<Token> {
    if x < 0 || y < 0 {
        return Err(TabletopError::Validation(
            "Token position must not be negative".into(),
        ));
    }

    let campaign_id = campaign_of_token(pool, token_id).await?;
    require_campaign_action(pool, campaign_id, user_id, CampaignAction::ManageContent).await?;

    let token = sqlx::query_as::<_, Token>(&format!(
        r"UPDATE tokens SET x = $2, y = $3, updated_at = NOW()
           WHERE id = $1
           RETURNING {TOKEN_COLUMNS}"
    ))
    .bind(token_id)
    .bind(x)
    .bind(y)
    .fetch_optional(pool)
    .await?
    .ok_or(TabletopError::NotFound("Token"))?;

    tracing::info!(%campaign_id, %token_id, x, y, "Token moved");
    Ok(token)
}
