//! Campaign Membership
//!
//! The (campaign, user, role, status) table every other component queries.

pub mod models;
pub mod store;

pub use models::{MemberStatus, Membership, Role};
pub use store::{
    get_membership, insert_membership, list_memberships, lock_membership, reactivate_membership,
    set_role, set_status,
};
