//! Permission resolution logic.
//!
//! Pure decisions over a member's role and status. No I/O happens here; the
//! helpers in [`super::helpers`] load the membership and call into this module.

use uuid::Uuid;

use crate::membership::{MemberStatus, Role};

/// Operation classes checked against a campaign membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignAction {
    /// Rename, describe, change visibility or lifecycle status.
    EditCampaign,
    /// Issue invites, change roles, revoke members.
    ManageMembers,
    /// Create or change scenes, maps, tokens and handouts.
    ManageContent,
    /// Read GM-only scenes, tokens and handouts.
    ViewAsGm,
    /// Read the player-facing view.
    ViewAsPlayer,
}

impl CampaignAction {
    /// Whether the action requires a GM role.
    #[must_use]
    pub const fn requires_gm(self) -> bool {
        match self {
            Self::EditCampaign | Self::ManageMembers | Self::ManageContent | Self::ViewAsGm => true,
            Self::ViewAsPlayer => false,
        }
    }
}

/// Decide whether a member may perform an action.
///
/// Pending and revoked members are denied everything.
#[must_use]
pub const fn authorize(role: Role, status: MemberStatus, action: CampaignAction) -> bool {
    match status {
        MemberStatus::Pending | MemberStatus::Revoked => false,
        MemberStatus::Accepted => {
            if action.requires_gm() {
                role.is_gm()
            } else {
                true
            }
        }
    }
}

/// Check a role change of `target_id` from `target_role` to `new_role`.
///
/// Rules:
/// 1. Only an owner may grant the owner role or change an owner's role
/// 2. An owner cannot change their own role
/// 3. The owner role is only granted to accepted members
///
/// The caller is expected to have passed `authorize(.., ManageMembers)` already.
pub fn can_change_role(
    actor_id: Uuid,
    actor_role: Role,
    target_id: Uuid,
    target_role: Role,
    target_status: MemberStatus,
    new_role: Role,
) -> Result<(), PermissionError> {
    let touches_owner = target_role == Role::Owner || new_role == Role::Owner;
    if touches_owner && actor_role != Role::Owner {
        return Err(PermissionError::NotPermitted);
    }

    if new_role == Role::Owner && target_status != MemberStatus::Accepted {
        return Err(PermissionError::NotPermitted);
    }

    if actor_id == target_id && actor_role == Role::Owner && new_role != Role::Owner {
        return Err(PermissionError::NotPermitted);
    }

    Ok(())
}

/// Check whether a member holding `target_role` may be revoked.
///
/// Owners are never revocable, by anyone.
pub const fn can_revoke(target_role: Role) -> Result<(), PermissionError> {
    match target_role {
        Role::Owner => Err(PermissionError::NotPermitted),
        Role::Editor | Role::Viewer => Ok(()),
    }
}

/// Permission check errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionError {
    /// User has no membership row in the campaign.
    NotCampaignMember,

    /// Membership exists but does not allow the action.
    NotPermitted,
}

impl std::fmt::Display for PermissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotCampaignMember => write!(f, "User is not a member of this campaign"),
            Self::NotPermitted => write!(f, "Action not permitted"),
        }
    }
}

impl std::error::Error for PermissionError {}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ACTIONS: [CampaignAction; 5] = [
        CampaignAction::EditCampaign,
        CampaignAction::ManageMembers,
        CampaignAction::ManageContent,
        CampaignAction::ViewAsGm,
        CampaignAction::ViewAsPlayer,
    ];

    fn change_accepted(
        actor: Uuid,
        actor_role: Role,
        target: Uuid,
        target_role: Role,
        new_role: Role,
    ) -> Result<(), PermissionError> {
        can_change_role(
            actor,
            actor_role,
            target,
            target_role,
            MemberStatus::Accepted,
            new_role,
        )
    }

    #[test]
    fn test_gm_roles_may_do_everything_when_accepted() {
        for role in [Role::Owner, Role::Editor] {
            for action in ALL_ACTIONS {
                assert!(
                    authorize(role, MemberStatus::Accepted, action),
                    "{role} should be allowed {action:?}"
                );
            }
        }
    }

    #[test]
    fn test_viewer_is_read_only() {
        assert!(authorize(
            Role::Viewer,
            MemberStatus::Accepted,
            CampaignAction::ViewAsPlayer
        ));
        for action in [
            CampaignAction::EditCampaign,
            CampaignAction::ManageMembers,
            CampaignAction::ManageContent,
            CampaignAction::ViewAsGm,
        ] {
            assert!(!authorize(Role::Viewer, MemberStatus::Accepted, action));
        }
    }

    #[test]
    fn test_non_accepted_members_are_denied_everything() {
        for status in [MemberStatus::Pending, MemberStatus::Revoked] {
            for role in [Role::Owner, Role::Editor, Role::Viewer] {
                for action in ALL_ACTIONS {
                    assert!(!authorize(role, status, action));
                }
            }
        }
    }

    #[test]
    fn test_only_owner_assigns_owner_role() {
        let actor = Uuid::new_v4();
        let target = Uuid::new_v4();

        assert_eq!(
            change_accepted(actor, Role::Editor, target, Role::Viewer, Role::Owner),
            Err(PermissionError::NotPermitted)
        );
        assert!(change_accepted(actor, Role::Owner, target, Role::Viewer, Role::Owner).is_ok());
    }

    #[test]
    fn test_editor_cannot_demote_owner() {
        let actor = Uuid::new_v4();
        let target = Uuid::new_v4();

        assert_eq!(
            change_accepted(actor, Role::Editor, target, Role::Owner, Role::Viewer),
            Err(PermissionError::NotPermitted)
        );
    }

    #[test]
    fn test_editor_can_shuffle_non_owner_roles() {
        let actor = Uuid::new_v4();
        let target = Uuid::new_v4();

        assert!(change_accepted(actor, Role::Editor, target, Role::Viewer, Role::Editor).is_ok());
        assert!(change_accepted(actor, Role::Editor, target, Role::Editor, Role::Viewer).is_ok());
    }

    #[test]
    fn test_owner_cannot_demote_self() {
        let owner = Uuid::new_v4();
        assert_eq!(
            change_accepted(owner, Role::Owner, owner, Role::Owner, Role::Editor),
            Err(PermissionError::NotPermitted)
        );
    }

    #[test]
    fn test_owner_role_only_granted_to_accepted_members() {
        let owner = Uuid::new_v4();
        let target = Uuid::new_v4();

        for status in [MemberStatus::Pending, MemberStatus::Revoked] {
            assert_eq!(
                can_change_role(owner, Role::Owner, target, Role::Editor, status, Role::Owner),
                Err(PermissionError::NotPermitted)
            );
        }
        assert!(can_change_role(
            owner,
            Role::Owner,
            target,
            Role::Viewer,
            MemberStatus::Revoked,
            Role::Editor
        )
        .is_ok());
    }

    #[test]
    fn test_owner_is_never_revocable() {
        assert_eq!(can_revoke(Role::Owner), Err(PermissionError::NotPermitted));
        assert!(can_revoke(Role::Editor).is_ok());
        assert!(can_revoke(Role::Viewer).is_ok());
    }

    #[test]
    fn test_permission_error_display() {
        assert!(PermissionError::NotCampaignMember
            .to_string()
            .contains("not a member"));
        assert!(PermissionError::NotPermitted
            .to_string()
            .contains("not permitted"));
    }
}
