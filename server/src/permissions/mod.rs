//! Permission gate for campaign operations.
//!
//! Three-role model (owner, editor, viewer) gated on membership status:
//! - Resolver: pure allow/deny decisions
//! - Helpers: load a membership and require an action in one step

pub mod helpers;
pub mod resolver;

pub use helpers::{load_membership, require_campaign_action};
pub use resolver::{authorize, can_change_role, can_revoke, CampaignAction, PermissionError};
