//! Invite Type Definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::membership::{MemberStatus, Membership, Role};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, utoipa::ToSchema,
)]
#[sqlx(type_name = "invite_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Active,
    Redeemed,
}

#[derive(Debug, Clone, FromRow, Serialize, utoipa::ToSchema)]
pub struct CampaignInvite {
    pub code: String,
    pub campaign_id: Uuid,
    pub created_by: Uuid,
    pub role_default: Role,
    pub status: InviteStatus,
    pub redeemed_by: Option<Uuid>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct CreateInviteRequest {
    /// `viewer` (default) or `editor`
    pub role_default: Option<String>,
    /// Absolute expiry. Missing or past values fall back to the server default.
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct InviteAcceptedResponse {
    pub campaign_id: Uuid,
    pub role: Role,
    pub status: MemberStatus,
}

impl From<Membership> for InviteAcceptedResponse {
    fn from(member: Membership) -> Self {
        Self {
            campaign_id: member.campaign_id,
            role: member.role,
            status: member.status,
        }
    }
}
