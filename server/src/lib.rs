//! Tabletop Server
//!
//! Campaign membership, invite codes and role-filtered table state for shared
//! tabletop sessions.

pub mod api;
pub mod auth;
pub mod campaigns;
pub mod config;
pub mod db;
pub mod error;
pub mod invites;
pub mod membership;
pub mod permissions;
pub mod tabletop;
