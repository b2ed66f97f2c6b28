//! Tabletop Aggregation
//!
//! Builds the role-filtered campaign snapshot. Rows are fetched flat and
//! assembled top-down by id. Filtering runs here, before serialization, so
//! hidden scenes and tokens never reach a non-GM caller.

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use super::content::{MAP_COLUMNS, SCENE_COLUMNS, TOKEN_COLUMNS};
use super::handouts::fetch_handouts;
use super::types::{is_visible, CampaignSnapshot, GameMap, MapView, Scene, SceneView, Token};
use crate::campaigns::characters::list_user_characters;
use crate::campaigns::service::get_campaign;
use crate::campaigns::types::MemberResponse;
use crate::error::{TabletopError, TabletopResult};
use crate::membership::{self, MemberStatus};
use crate::permissions::{authorize, require_campaign_action, CampaignAction};

/// Assemble scenes, maps and tokens into the tree visible to the reader.
///
/// GMs get every scene and token. Everyone else gets only the active scene,
/// without `gm-only` tokens.
#[must_use]
pub fn assemble_scenes(
    scenes: Vec<Scene>,
    maps: Vec<GameMap>,
    tokens: Vec<Token>,
    active_scene_id: Option<Uuid>,
    is_gm: bool,
) -> Vec<SceneView> {
    let mut tokens_by_map: HashMap<Uuid, Vec<Token>> = HashMap::new();
    for token in tokens {
        if is_visible(&token.audience, is_gm) {
            tokens_by_map.entry(token.map_id).or_default().push(token);
        }
    }

    let mut maps_by_scene: HashMap<Uuid, Vec<MapView>> = HashMap::new();
    for map in maps {
        let tokens = tokens_by_map.remove(&map.id).unwrap_or_default();
        maps_by_scene
            .entry(map.scene_id)
            .or_default()
            .push(MapView { map, tokens });
    }

    scenes
        .into_iter()
        .filter(|scene| is_gm || Some(scene.id) == active_scene_id)
        .map(|scene| {
            let maps = maps_by_scene.remove(&scene.id).unwrap_or_default();
            SceneView { scene, maps }
        })
        .collect()
}

/// Full snapshot of a campaign for `user_id`.
#[tracing::instrument(skip(pool))]
pub async fn get_full(
    pool: &PgPool,
    campaign_id: Uuid,
    user_id: Uuid,
) -> TabletopResult<CampaignSnapshot> {
    let caller =
        require_campaign_action(pool, campaign_id, user_id, CampaignAction::ViewAsPlayer).await?;
    let is_gm = authorize(caller.role, caller.status, CampaignAction::ViewAsGm);

    let campaign = get_campaign(pool, campaign_id)
        .await?
        .ok_or(TabletopError::NotFound("Campaign"))?;

    let scenes_query = format!(
        "SELECT {SCENE_COLUMNS} FROM scenes WHERE campaign_id = $1 ORDER BY created_at ASC"
    );
    let maps_query = format!(
        r"SELECT {} FROM maps m
           INNER JOIN scenes s ON s.id = m.scene_id
           WHERE s.campaign_id = $1
           ORDER BY m.created_at ASC",
        prefixed("m", MAP_COLUMNS)
    );
    let tokens_query = format!(
        r"SELECT {} FROM tokens t
           INNER JOIN maps m ON m.id = t.map_id
           INNER JOIN scenes s ON s.id = m.scene_id
           WHERE s.campaign_id = $1
           ORDER BY t.created_at ASC",
        prefixed("t", TOKEN_COLUMNS)
    );

    let (members, characters, handouts, scenes, maps, tokens) = futures::try_join!(
        membership::list_memberships(pool, campaign_id),
        list_user_characters(pool, campaign_id, user_id),
        fetch_handouts(pool, campaign_id),
        sqlx::query_as::<_, Scene>(&scenes_query)
            .bind(campaign_id)
            .fetch_all(pool),
        sqlx::query_as::<_, GameMap>(&maps_query)
            .bind(campaign_id)
            .fetch_all(pool),
        sqlx::query_as::<_, Token>(&tokens_query)
            .bind(campaign_id)
            .fetch_all(pool),
    )?;

    let members: Vec<MemberResponse> = members
        .into_iter()
        .filter(|m| is_gm || m.status == MemberStatus::Accepted)
        .map(Into::into)
        .collect();
    let handouts = handouts
        .into_iter()
        .filter(|h| is_visible(&h.audience, is_gm))
        .collect();
    let scenes = assemble_scenes(scenes, maps, tokens, campaign.active_scene_id, is_gm);

    tracing::debug!(
        %campaign_id,
        %user_id,
        role = %caller.role,
        scenes = scenes.len(),
        "Snapshot assembled"
    );

    Ok(CampaignSnapshot {
        campaign,
        role: caller.role,
        members,
        characters,
        handouts,
        scenes,
    })
}

/// Qualify a column list with a table alias.
fn prefixed(alias: &str, columns: &str) -> String {
    columns
        .split(',')
        .map(|column| format!("{alias}.{}", column.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
