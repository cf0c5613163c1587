//! Group types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique group identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub Uuid);

impl GroupId {
    /// Create a new random group ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a group ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for GroupId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Outcome of redeeming a group activation token.
///
/// These are normal outcomes, not errors: a caller-facing API maps them onto
/// its own response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationResult {
    /// No activation token matched within its validity window
    WrongToken,
    /// The user is already a member of the resolved group
    AlreadyActivated,
    /// A membership row was created
    New,
    /// The membership insert was attempted but did not succeed
    Failed,
}
