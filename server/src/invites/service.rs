//! Invite Lifecycle
//!
//! An invite starts `active` and moves to `redeemed` at most once. Issuing
//! relies on the primary key on `code` plus bounded retry; redeeming stamps the
//! invite and upserts the membership inside one transaction.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::codes::CodeGenerator;
use super::types::{CampaignInvite, InviteStatus};
use crate::config::InviteSettings;
use crate::error::{is_unique_violation, TabletopError, TabletopResult};
use crate::membership::{self, MemberStatus, Membership, Role};
use crate::permissions::{require_campaign_action, CampaignAction};

const INVITE_COLUMNS: &str = "code, campaign_id, created_by, role_default, status, \
                              redeemed_by, redeemed_at, expires_at, created_at";

/// Parse the role an invite grants. Only `viewer` and `editor` are legal.
pub fn parse_role_default(role: Option<&str>) -> TabletopResult<Role> {
    match role.map(str::parse::<Role>).transpose()? {
        None | Some(Role::Viewer) => Ok(Role::Viewer),
        Some(Role::Editor) => Ok(Role::Editor),
        Some(Role::Owner) => Err(TabletopError::InvalidState(
            "invites cannot grant the owner role".into(),
        )),
    }
}

/// Pick the expiry for a new invite. Missing or past values get the default.
pub fn resolve_expiry(
    requested: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    default_days: i64,
) -> DateTime<Utc> {
    match requested {
        Some(at) if at > now => at,
        _ => now + Duration::days(default_days),
    }
}

/// Check whether an invite can be redeemed at `now`.
///
/// Precedence: a redeemed invite always reports `InviteRedeemed`, even when it
/// has also expired. Both the status and the redeemer column are checked.
pub fn check_redeemable(invite: &CampaignInvite, now: DateTime<Utc>) -> TabletopResult<()> {
    if invite.status != InviteStatus::Active || invite.redeemed_by.is_some() {
        return Err(TabletopError::InviteRedeemed);
    }

    if now > invite.expires_at {
        return Err(TabletopError::InviteExpired);
    }

    Ok(())
}

/// Issue a new invite for a campaign.
#[tracing::instrument(skip(pool, generator))]
pub async fn issue_invite<G>(
    pool: &PgPool,
    generator: &G,
    settings: &InviteSettings,
    campaign_id: Uuid,
    user_id: Uuid,
    role_default: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
) -> TabletopResult<CampaignInvite>
where
    G: CodeGenerator + ?Sized,
{
    require_campaign_action(pool, campaign_id, user_id, CampaignAction::ManageMembers).await?;

    let role_default = parse_role_default(role_default)?;

    let expires_at = resolve_expiry(expires_at, Utc::now(), settings.default_expiry_days);

    for attempt in 1..=settings.max_code_attempts {
        let code = generator.generate(settings.code_length);

        let result = sqlx::query_as::<_, CampaignInvite>(&format!(
            r"INSERT INTO campaign_invites (code, campaign_id, created_by, role_default, expires_at)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {INVITE_COLUMNS}"
        ))
        .bind(&code)
        .bind(campaign_id)
        .bind(user_id)
        .bind(role_default)
        .bind(expires_at)
        .fetch_one(pool)
        .await;

        match result {
            Ok(invite) => {
                tracing::info!(
                    %campaign_id,
                    %user_id,
                    role = %invite.role_default,
                    attempt,
                    "Invite issued"
                );
                return Ok(invite);
            }
            Err(ref err) if is_unique_violation(err) => {
                tracing::debug!(attempt, "Invite code collision, regenerating");
            }
            Err(err) => return Err(TabletopError::Database(err)),
        }
    }

    Err(TabletopError::CouldNotGenerateCode(settings.max_code_attempts))
}

/// Active, unexpired invites of a campaign.
#[tracing::instrument(skip(pool))]
pub async fn list_invites(
    pool: &PgPool,
    campaign_id: Uuid,
    user_id: Uuid,
) -> TabletopResult<Vec<CampaignInvite>> {
    require_campaign_action(pool, campaign_id, user_id, CampaignAction::ManageMembers).await?;

    let invites = sqlx::query_as::<_, CampaignInvite>(&format!(
        r"SELECT {INVITE_COLUMNS} FROM campaign_invites
           WHERE campaign_id = $1 AND status = 'active' AND expires_at > NOW()
           ORDER BY created_at DESC"
    ))
    .bind(campaign_id)
    .fetch_all(pool)
    .await?;

    Ok(invites)
}

/// Redeem an invite code for `user_id`.
///
/// The invite row is locked for the duration of the transaction so concurrent
/// redemptions of one code serialize; only the first one commits.
#[tracing::instrument(skip(pool))]
pub async fn redeem_invite(pool: &PgPool, code: &str, user_id: Uuid) -> TabletopResult<Membership> {
    let mut tx = pool.begin().await?;

    let invite = sqlx::query_as::<_, CampaignInvite>(&format!(
        "SELECT {INVITE_COLUMNS} FROM campaign_invites WHERE code = $1 FOR UPDATE"
    ))
    .bind(code)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(TabletopError::NotFound("Invite"))?;

    check_redeemable(&invite, Utc::now())?;

    let existing = membership::get_membership(&mut *tx, invite.campaign_id, user_id).await?;
    if existing
        .as_ref()
        .is_some_and(|m| m.status == MemberStatus::Accepted)
    {
        return Err(TabletopError::AlreadyMember);
    }

    let stamped = sqlx::query(
        r"UPDATE campaign_invites
           SET status = 'redeemed', redeemed_by = $2, redeemed_at = NOW()
           WHERE code = $1 AND status = 'active' AND redeemed_by IS NULL",
    )
    .bind(&invite.code)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    if stamped.rows_affected() != 1 {
        return Err(TabletopError::InviteRedeemed);
    }

    // A concurrent redemption by the same user under another code may have
    // inserted or reactivated the row since it was read above.
    let member = match existing {
        None => membership::insert_membership(
            &mut *tx,
            invite.campaign_id,
            user_id,
            invite.role_default,
            MemberStatus::Accepted,
            Some(invite.created_by),
        )
        .await
        .map_err(|err| match err {
            TabletopError::AlreadyExists(_) => TabletopError::AlreadyMember,
            other => other,
        })?,
        Some(_) => membership::reactivate_membership(
            &mut *tx,
            invite.campaign_id,
            user_id,
            invite.role_default,
            invite.created_by,
        )
        .await?
        .ok_or(TabletopError::AlreadyMember)?,
    };

    tx.commit().await?;

    tracing::info!(
        campaign_id = %invite.campaign_id,
        %user_id,
        role = %member.role,
        "Invite redeemed"
    );

    Ok(member)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::campaigns::service::create_campaign;
    use crate::invites::codes::RandomCodeGenerator;

    /// Hands out a fixed sequence of codes.
    struct ScriptedCodes(Mutex<VecDeque<String>>);

    impl ScriptedCodes {
        fn new(codes: &[&str]) -> Self {
            Self(Mutex::new(codes.iter().map(|c| (*c).to_string()).collect()))
        }
    }

    impl CodeGenerator for ScriptedCodes {
        fn generate(&self, _length: usize) -> String {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .expect("ScriptedCodes ran out of codes")
        }
    }

    fn invite(status: InviteStatus, redeemed: bool, expires_in: Duration) -> CampaignInvite {
        let now = Utc::now();
        CampaignInvite {
            code: "ABCDEFGH".into(),
            campaign_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            role_default: Role::Viewer,
            status,
            redeemed_by: redeemed.then(Uuid::new_v4),
            redeemed_at: redeemed.then_some(now),
            expires_at: now + expires_in,
            created_at: now,
        }
    }

    async fn seed_code(pool: &PgPool, campaign_id: Uuid, owner: Uuid, code: &str) {
        sqlx::query(
            "INSERT INTO campaign_invites (code, campaign_id, created_by, expires_at)
             VALUES ($1, $2, $3, NOW() + INTERVAL '1 day')",
        )
        .bind(code)
        .bind(campaign_id)
        .bind(owner)
        .execute(pool)
        .await
        .unwrap();
    }

    // ========================================================================
    // Pure rules
    // ========================================================================

    #[test]
    fn test_role_default_rules() {
        assert_eq!(parse_role_default(None).unwrap(), Role::Viewer);
        assert_eq!(parse_role_default(Some("viewer")).unwrap(), Role::Viewer);
        assert_eq!(parse_role_default(Some("editor")).unwrap(), Role::Editor);
        assert!(matches!(
            parse_role_default(Some("owner")),
            Err(TabletopError::InvalidState(_))
        ));
        assert!(matches!(
            parse_role_default(Some("gm")),
            Err(TabletopError::InvalidState(_))
        ));
    }

    #[test]
    fn test_past_expiry_falls_back_to_default() {
        let now = Utc::now();
        assert_eq!(
            resolve_expiry(Some(now - Duration::hours(1)), now, 7),
            now + Duration::days(7)
        );
        assert_eq!(resolve_expiry(None, now, 7), now + Duration::days(7));

        let future = now + Duration::days(2);
        assert_eq!(resolve_expiry(Some(future), now, 7), future);
    }

    #[test]
    fn test_active_unexpired_invite_is_redeemable() {
        let inv = invite(InviteStatus::Active, false, Duration::days(1));
        assert!(check_redeemable(&inv, Utc::now()).is_ok());
    }

    #[test]
    fn test_expired_invite_is_rejected() {
        let inv = invite(InviteStatus::Active, false, Duration::seconds(-1));
        assert!(matches!(
            check_redeemable(&inv, Utc::now()),
            Err(TabletopError::InviteExpired)
        ));
    }

    #[test]
    fn test_redeemed_wins_over_expired() {
        let inv = invite(InviteStatus::Redeemed, true, Duration::days(-3));
        assert!(matches!(
            check_redeemable(&inv, Utc::now()),
            Err(TabletopError::InviteRedeemed)
        ));
    }

    #[test]
    fn test_half_applied_redemption_is_caught() {
        // Redeemer recorded while status still says active
        let inv = invite(InviteStatus::Active, true, Duration::days(1));
        assert!(matches!(
            check_redeemable(&inv, Utc::now()),
            Err(TabletopError::InviteRedeemed)
        ));

        // Status flipped without a redeemer
        let inv = invite(InviteStatus::Redeemed, false, Duration::days(1));
        assert!(matches!(
            check_redeemable(&inv, Utc::now()),
            Err(TabletopError::InviteRedeemed)
        ));
    }

    // ========================================================================
    // Store-backed flows
    // ========================================================================

    #[sqlx::test]
    async fn test_editor_invite_redeemed_once(pool: PgPool) {
        let owner = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let campaign = create_campaign(&pool, owner, "Lost Mine", None, None, None)
            .await
            .unwrap();

        let issued = issue_invite(
            &pool,
            &RandomCodeGenerator,
            &InviteSettings::default(),
            campaign.id,
            owner,
            Some("editor"),
            None,
        )
        .await
        .expect("Failed to issue invite");
        assert_eq!(issued.role_default, Role::Editor);
        assert_eq!(issued.status, InviteStatus::Active);

        let member = redeem_invite(&pool, &issued.code, guest)
            .await
            .expect("Redemption failed");
        assert_eq!(member.role, Role::Editor);
        assert_eq!(member.status, MemberStatus::Accepted);
        assert_eq!(member.invited_by, Some(owner));

        let again = redeem_invite(&pool, &issued.code, Uuid::new_v4()).await;
        assert!(matches!(again, Err(TabletopError::InviteRedeemed)));
    }

    #[sqlx::test]
    async fn test_issue_retries_past_collisions(pool: PgPool) {
        let owner = Uuid::new_v4();
        let campaign = create_campaign(&pool, owner, "Retry", None, None, None)
            .await
            .unwrap();
        for code in ["TAKEN001", "TAKEN002", "TAKEN003"] {
            seed_code(&pool, campaign.id, owner, code).await;
        }

        let generator = ScriptedCodes::new(&["TAKEN001", "TAKEN002", "TAKEN003", "FRESHONE"]);
        let issued = issue_invite(
            &pool,
            &generator,
            &InviteSettings::default(),
            campaign.id,
            owner,
            None,
            None,
        )
        .await
        .expect("Fourth attempt should succeed");

        assert_eq!(issued.code, "FRESHONE");
        assert_eq!(issued.role_default, Role::Viewer);
    }

    #[sqlx::test]
    async fn test_issue_gives_up_after_max_attempts(pool: PgPool) {
        let owner = Uuid::new_v4();
        let campaign = create_campaign(&pool, owner, "Exhausted", None, None, None)
            .await
            .unwrap();
        seed_code(&pool, campaign.id, owner, "TAKEN001").await;

        let generator = ScriptedCodes::new(&["TAKEN001"; 5]);
        let result = issue_invite(
            &pool,
            &generator,
            &InviteSettings::default(),
            campaign.id,
            owner,
            None,
            None,
        )
        .await;

        assert!(matches!(result, Err(TabletopError::CouldNotGenerateCode(5))));
    }

    #[sqlx::test]
    async fn test_viewer_cannot_issue_invites(pool: PgPool) {
        let owner = Uuid::new_v4();
        let viewer = Uuid::new_v4();
        let campaign = create_campaign(&pool, owner, "Closed", None, None, None)
            .await
            .unwrap();
        membership::insert_membership(
            &pool,
            campaign.id,
            viewer,
            Role::Viewer,
            MemberStatus::Accepted,
            Some(owner),
        )
        .await
        .unwrap();

        let result = issue_invite(
            &pool,
            &RandomCodeGenerator,
            &InviteSettings::default(),
            campaign.id,
            viewer,
            None,
            None,
        )
        .await;
        assert!(matches!(result, Err(TabletopError::NotPermitted)));
    }

    #[sqlx::test]
    async fn test_outsider_is_refused_before_role_is_parsed(pool: PgPool) {
        let owner = Uuid::new_v4();
        let campaign = create_campaign(&pool, owner, "Gated", None, None, None)
            .await
            .unwrap();

        let result = issue_invite(
            &pool,
            &RandomCodeGenerator,
            &InviteSettings::default(),
            campaign.id,
            Uuid::new_v4(),
            Some("owner"),
            None,
        )
        .await;
        assert!(matches!(result, Err(TabletopError::NotCampaignMember)));

        let result = issue_invite(
            &pool,
            &RandomCodeGenerator,
            &InviteSettings::default(),
            campaign.id,
            owner,
            Some("owner"),
            None,
        )
        .await;
        assert!(matches!(result, Err(TabletopError::InvalidState(_))));
    }

    #[sqlx::test]
    async fn test_expired_invite_cannot_be_redeemed(pool: PgPool) {
        let owner = Uuid::new_v4();
        let campaign = create_campaign(&pool, owner, "Late", None, None, None)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO campaign_invites (code, campaign_id, created_by, expires_at)
             VALUES ('EXPIRED1', $1, $2, NOW() - INTERVAL '1 minute')",
        )
        .bind(campaign.id)
        .bind(owner)
        .execute(&pool)
        .await
        .unwrap();

        // Expiry is checked before membership, so even the owner is told it expired
        let as_owner = redeem_invite(&pool, "EXPIRED1", owner).await;
        assert!(matches!(as_owner, Err(TabletopError::InviteExpired)));

        let as_guest = redeem_invite(&pool, "EXPIRED1", Uuid::new_v4()).await;
        assert!(matches!(as_guest, Err(TabletopError::InviteExpired)));
    }

    #[sqlx::test]
    async fn test_existing_member_is_rejected_and_invite_stays_active(pool: PgPool) {
        let owner = Uuid::new_v4();
        let campaign = create_campaign(&pool, owner, "Mine", None, None, None)
            .await
            .unwrap();
        seed_code(&pool, campaign.id, owner, "OWNCODE1").await;

        let result = redeem_invite(&pool, "OWNCODE1", owner).await;
        assert!(matches!(result, Err(TabletopError::AlreadyMember)));

        let status: InviteStatus =
            sqlx::query_scalar("SELECT status FROM campaign_invites WHERE code = 'OWNCODE1'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(status, InviteStatus::Active);
    }

    #[sqlx::test]
    async fn test_revoked_member_is_reactivated_in_place(pool: PgPool) {
        let owner = Uuid::new_v4();
        let returning = Uuid::new_v4();
        let campaign = create_campaign(&pool, owner, "Return", None, None, None)
            .await
            .unwrap();
        membership::insert_membership(
            &pool,
            campaign.id,
            returning,
            Role::Editor,
            MemberStatus::Revoked,
            Some(owner),
        )
        .await
        .unwrap();
        seed_code(&pool, campaign.id, owner, "COMEBACK").await;

        let member = redeem_invite(&pool, "COMEBACK", returning).await.unwrap();
        assert_eq!(member.role, Role::Viewer);
        assert_eq!(member.status, MemberStatus::Accepted);

        let rows: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM campaign_members WHERE campaign_id = $1 AND user_id = $2",
        )
        .bind(campaign.id)
        .bind(returning)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(rows, 1);
    }

    #[sqlx::test]
    async fn test_same_user_racing_two_codes_joins_once(pool: PgPool) {
        let owner = Uuid::new_v4();
        let campaign = create_campaign(&pool, owner, "Twin Codes", None, None, None)
            .await
            .unwrap();
        let lapsed = Uuid::new_v4();
        membership::insert_membership(
            &pool,
            campaign.id,
            lapsed,
            Role::Viewer,
            MemberStatus::Revoked,
            Some(owner),
        )
        .await
        .unwrap();

        // A user with no row and a user with a revoked row both race two codes
        let users = [Uuid::new_v4(), lapsed];
        for (round, user) in users.into_iter().enumerate() {
            let codes = [format!("TWINA00{round}"), format!("TWINB00{round}")];
            for code in &codes {
                seed_code(&pool, campaign.id, owner, code).await;
            }

            let attempts: Vec<_> = codes
                .iter()
                .cloned()
                .map(|code| {
                    let pool = pool.clone();
                    tokio::spawn(async move { redeem_invite(&pool, &code, user).await })
                })
                .collect();

            let mut joined = 0;
            for handle in attempts {
                match handle.await.unwrap() {
                    Ok(member) => {
                        assert_eq!(member.status, MemberStatus::Accepted);
                        joined += 1;
                    }
                    Err(TabletopError::AlreadyMember) => {}
                    Err(other) => panic!("Unexpected error: {other:?}"),
                }
            }
            assert_eq!(joined, 1);

            // The losing code rolled back and is still usable
            let redeemed: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM campaign_invites WHERE code = ANY($1) AND status = 'redeemed'",
            )
            .bind(&codes[..])
            .fetch_one(&pool)
            .await
            .unwrap();
            assert_eq!(redeemed, 1);
        }
    }

    #[sqlx::test]
    async fn test_unknown_code_is_not_found(pool: PgPool) {
        let result = redeem_invite(&pool, "NOPE2345", Uuid::new_v4()).await;
        assert!(matches!(result, Err(TabletopError::NotFound("Invite"))));
    }

    #[sqlx::test]
    async fn test_concurrent_redemptions_commit_once(pool: PgPool) {
        let owner = Uuid::new_v4();
        let campaign = create_campaign(&pool, owner, "Race", None, None, None)
            .await
            .unwrap();
        seed_code(&pool, campaign.id, owner, "RACECODE").await;

        let attempts: Vec<_> = (0..4)
            .map(|_| {
                let pool = pool.clone();
                tokio::spawn(async move { redeem_invite(&pool, "RACECODE", Uuid::new_v4()).await })
            })
            .collect();

        let mut successes = 0;
        for handle in attempts {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(TabletopError::InviteRedeemed) => {}
                Err(other) => panic!("Unexpected error: {other:?}"),
            }
        }
        assert_eq!(successes, 1);

        let members: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM campaign_members WHERE campaign_id = $1 AND role = 'viewer'",
        )
        .bind(campaign.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(members, 1);
    }
}
