//! Role types
//!
//! Roles are static reference data seeded once (admin / editor / user) and
//! read-only from the authentication core's perspective.

use serde::{Deserialize, Serialize};

/// Role identifier referencing the seeded roles table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub i32);

impl RoleId {
    /// Seeded administrator role
    pub const ADMIN: RoleId = RoleId(1);
    /// Seeded editor role
    pub const EDITOR: RoleId = RoleId(2);
    /// Baseline role assigned to every newly created user
    pub const BASELINE: RoleId = RoleId(3);
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for RoleId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}
