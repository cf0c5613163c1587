//! Gatehouse Types - Shared domain types
//!
//! This crate contains domain types used across Gatehouse crates:
//! - User identity (ids, validated email addresses)
//! - Roles and groups
//! - Group activation outcomes

pub mod email;
pub mod group;
pub mod role;
pub mod user;

pub use email::*;
pub use group::*;
pub use role::*;
pub use user::*;
