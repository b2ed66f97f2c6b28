//! Membership Store
//!
//! Reads and writes keyed by the unique (campaign, user) pair. Every function
//! takes a generic executor so the same query runs against the pool or inside
//! a caller's transaction.

use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use super::models::{MemberStatus, Membership, Role};
use crate::error::{is_unique_violation, TabletopError, TabletopResult};

const MEMBERSHIP_COLUMNS: &str =
    "campaign_id, user_id, role, status, invited_by, joined_at, updated_at";

/// Fetch the membership row for a (campaign, user) pair.
///
/// `None` means the user is not a member in any state.
pub async fn get_membership<'e, E>(
    executor: E,
    campaign_id: Uuid,
    user_id: Uuid,
) -> sqlx::Result<Option<Membership>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Membership>(&format!(
        "SELECT {MEMBERSHIP_COLUMNS} FROM campaign_members WHERE campaign_id = $1 AND user_id = $2"
    ))
    .bind(campaign_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Fetch and row-lock a membership for the rest of the caller's transaction.
///
/// Concurrent role changes and revocations of the same member queue behind
/// the lock, so guards evaluated on the returned row still hold at write time.
pub async fn lock_membership(
    conn: &mut PgConnection,
    campaign_id: Uuid,
    user_id: Uuid,
) -> sqlx::Result<Option<Membership>> {
    sqlx::query_as::<_, Membership>(&format!(
        r"SELECT {MEMBERSHIP_COLUMNS} FROM campaign_members
           WHERE campaign_id = $1 AND user_id = $2
           FOR UPDATE"
    ))
    .bind(campaign_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

/// Insert a new membership row.
///
/// A second insert for the same pair fails with `AlreadyExists` instead of
/// duplicating the row.
pub async fn insert_membership<'e, E>(
    executor: E,
    campaign_id: Uuid,
    user_id: Uuid,
    role: Role,
    status: MemberStatus,
    invited_by: Option<Uuid>,
) -> TabletopResult<Membership>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query_as::<_, Membership>(&format!(
        r"INSERT INTO campaign_members (campaign_id, user_id, role, status, invited_by)
           VALUES ($1, $2, $3, $4, $5)
           RETURNING {MEMBERSHIP_COLUMNS}"
    ))
    .bind(campaign_id)
    .bind(user_id)
    .bind(role)
    .bind(status)
    .bind(invited_by)
    .fetch_one(executor)
    .await;

    match result {
        Ok(membership) => Ok(membership),
        Err(ref err) if is_unique_violation(err) => Err(TabletopError::AlreadyExists("Membership")),
        Err(err) => Err(TabletopError::Database(err)),
    }
}

/// Set a member's role. Returns `false` if no row matched.
pub async fn set_role<'e, E>(
    executor: E,
    campaign_id: Uuid,
    user_id: Uuid,
    role: Role,
) -> sqlx::Result<bool>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r"UPDATE campaign_members SET role = $3, updated_at = NOW()
           WHERE campaign_id = $1 AND user_id = $2",
    )
    .bind(campaign_id)
    .bind(user_id)
    .bind(role)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Set a member's status. Returns `false` if no row matched.
pub async fn set_status<'e, E>(
    executor: E,
    campaign_id: Uuid,
    user_id: Uuid,
    status: MemberStatus,
) -> sqlx::Result<bool>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r"UPDATE campaign_members SET status = $3, updated_at = NOW()
           WHERE campaign_id = $1 AND user_id = $2",
    )
    .bind(campaign_id)
    .bind(user_id)
    .bind(status)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Overwrite role, status and inviter of an existing non-accepted row.
///
/// Used when a previously revoked or pending user redeems an invite. Returns
/// `None` if the row is missing or already accepted.
pub async fn reactivate_membership<'e, E>(
    executor: E,
    campaign_id: Uuid,
    user_id: Uuid,
    role: Role,
    invited_by: Uuid,
) -> sqlx::Result<Option<Membership>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Membership>(&format!(
        r"UPDATE campaign_members
           SET role = $3, status = 'accepted', invited_by = $4, updated_at = NOW()
           WHERE campaign_id = $1 AND user_id = $2 AND status <> 'accepted'
           RETURNING {MEMBERSHIP_COLUMNS}"
    ))
    .bind(campaign_id)
    .bind(user_id)
    .bind(role)
    .bind(invited_by)
    .fetch_optional(executor)
    .await
}

/// List every membership row of a campaign, owners first.
pub async fn list_memberships<'e, E>(executor: E, campaign_id: Uuid) -> sqlx::Result<Vec<Membership>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Membership>(&format!(
        r"SELECT {MEMBERSHIP_COLUMNS} FROM campaign_members
           WHERE campaign_id = $1
           ORDER BY role ASC, joined_at ASC"
    ))
    .bind(campaign_id)
    .fetch_all(executor)
    .await
}
