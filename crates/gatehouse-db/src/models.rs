//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.
//! Every query returns one of these typed records instead of a loosely
//! keyed map, so shape mismatches fail at the store boundary.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub role_id: i32,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// One-time email login token row
#[derive(Debug, Clone, FromRow)]
pub struct EmailTokenRow {
    pub id: Uuid,
    pub email: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// Session token row.
///
/// Session and remember-me tokens share this table; they differ only in the
/// validity window applied on lookup. `updated_at` slides forward on every
/// successful validation.
#[derive(Debug, Clone, FromRow)]
pub struct SessionTokenRow {
    pub user_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Group row from the database (reference data managed outside this core)
#[derive(Debug, Clone, FromRow)]
pub struct GroupRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name_public: String,
    pub internal_notes: Option<String>,
}

/// Group membership row.
///
/// No uniqueness constraint is assumed over (user_id, group_id); readers
/// must treat membership as a set.
#[derive(Debug, Clone, FromRow)]
pub struct GroupMembershipRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub group_id: Uuid,
}

/// Group activation token row (read-only here)
#[derive(Debug, Clone, FromRow)]
pub struct GroupActivationTokenRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub group_id: Uuid,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub token: String,
}

// Conversion implementations from row types to gatehouse-types domain types
impl UserRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> gatehouse_types::UserId {
        gatehouse_types::UserId(self.id)
    }

    /// Convert to domain RoleId
    pub fn role_id(&self) -> gatehouse_types::RoleId {
        gatehouse_types::RoleId(self.role_id)
    }
}

impl SessionTokenRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> gatehouse_types::UserId {
        gatehouse_types::UserId(self.user_id)
    }
}

impl GroupActivationTokenRow {
    /// Convert to domain GroupId
    pub fn group_id(&self) -> gatehouse_types::GroupId {
        gatehouse_types::GroupId(self.group_id)
    }
}
