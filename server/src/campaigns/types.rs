//! Campaign Type Definitions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::TabletopError;
use crate::membership::{MemberStatus, Role};

// ============================================================================
// Enumerations
// ============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, utoipa::ToSchema,
)]
#[sqlx(type_name = "campaign_visibility", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CampaignVisibility {
    #[default]
    Private,
    Invite,
}

impl FromStr for CampaignVisibility {
    type Err = TabletopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Self::Private),
            "invite" => Ok(Self::Invite),
            other => Err(TabletopError::InvalidState(format!("visibility '{other}'"))),
        }
    }
}

/// Campaign lifecycle status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, utoipa::ToSchema,
)]
#[sqlx(type_name = "campaign_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    NotStarted,
    InProgress,
    Paused,
    Completed,
    Archived,
}

impl CampaignStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = TabletopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            other => Err(TabletopError::InvalidState(format!("campaign status '{other}'"))),
        }
    }
}

/// Parse an optional enum value, falling back to its default when absent.
pub fn parse_or_default<T>(value: Option<&str>) -> Result<T, TabletopError>
where
    T: FromStr<Err = TabletopError> + Default,
{
    value.map_or_else(|| Ok(T::default()), |v| v.parse())
}

// ============================================================================
// Campaign Entity
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, utoipa::ToSchema)]
pub struct Campaign {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub visibility: CampaignVisibility,
    pub status: CampaignStatus,
    pub active_scene_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Campaign with the caller's role, for list responses.
#[derive(Debug, Clone, FromRow, Serialize, utoipa::ToSchema)]
pub struct CampaignSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub campaign: Campaign,
    pub role: Role,
}

/// Character linked to a campaign.
#[derive(Debug, Clone, FromRow, Serialize, utoipa::ToSchema)]
pub struct CampaignCharacter {
    pub character_id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub added_at: DateTime<Utc>,
}

/// Member row as returned by the members endpoint.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct MemberResponse {
    pub user_id: Uuid,
    pub role: Role,
    pub status: MemberStatus,
    pub invited_by: Option<Uuid>,
    pub joined_at: DateTime<Utc>,
}

impl From<crate::membership::Membership> for MemberResponse {
    fn from(member: crate::membership::Membership) -> Self {
        Self {
            user_id: member.user_id,
            role: member.role,
            status: member.status,
            invited_by: member.invited_by,
            joined_at: member.joined_at,
        }
    }
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateCampaignRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    /// `private` (default) or `invite`
    pub visibility: Option<String>,
    /// Lifecycle status, `not_started` by default
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateCampaignRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub visibility: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateMemberRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddCharacterRequest {
    pub character_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_defaults_to_private() {
        let visibility: CampaignVisibility = parse_or_default(None).unwrap();
        assert_eq!(visibility, CampaignVisibility::Private);
    }

    #[test]
    fn test_status_defaults_to_not_started() {
        let status: CampaignStatus = parse_or_default(None).unwrap();
        assert_eq!(status, CampaignStatus::NotStarted);
    }

    #[test]
    fn test_unknown_values_are_invalid_state() {
        assert!(matches!(
            parse_or_default::<CampaignVisibility>(Some("public")),
            Err(TabletopError::InvalidState(_))
        ));
        assert!(matches!(
            parse_or_default::<CampaignStatus>(Some("finished")),
            Err(TabletopError::InvalidState(_))
        ));
    }

    #[test]
    fn test_all_lifecycle_values_parse() {
        for status in [
            CampaignStatus::NotStarted,
            CampaignStatus::InProgress,
            CampaignStatus::Paused,
            CampaignStatus::Completed,
            CampaignStatus::Archived,
        ] {
            assert_eq!(status.as_str().parse::<CampaignStatus>().unwrap(), status);
        }
    }
}
