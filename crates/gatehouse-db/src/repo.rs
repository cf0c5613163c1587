//! Repository traits
//!
//! Define async repository interfaces for the credential store. The
//! authentication core is generic over these traits; production code uses
//! the PostgreSQL implementations in [`crate::pg`], tests use in-memory
//! fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;

    /// Find a user by email (case-sensitive exact match)
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    /// Create a user for this email unless one already exists.
    ///
    /// Returns the row together with `true` when this call created it.
    /// Keyed on the unique email column, so concurrent callers converge on
    /// one row and the operation is safe to retry.
    async fn create_if_absent(&self, email: &str) -> DbResult<(UserRow, bool)>;

    /// Set the user's last login timestamp to now
    async fn touch_last_login(&self, email: &str) -> DbResult<()>;
}

/// One-time email login token repository trait
#[async_trait]
pub trait EmailTokenRepository: Send + Sync {
    /// Persist a freshly generated login token for this email
    async fn create(&self, email: &str, token: &str) -> DbResult<EmailTokenRow>;

    /// Atomically consume a token created after `cutoff`.
    ///
    /// Deletes and returns the matching row in one statement; of two
    /// concurrent redemptions at most one gets the row back. Expired or
    /// unknown tokens return `None` with no side effect.
    async fn consume_valid(
        &self,
        token: &str,
        cutoff: DateTime<Utc>,
    ) -> DbResult<Option<EmailTokenRow>>;

    /// Delete tokens created before `cutoff`; returns the number removed.
    ///
    /// Never called by the core itself; expired rows are garbage collected
    /// by an external janitor process.
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> DbResult<u64>;
}

/// Session token repository trait.
///
/// Session and remember-me tokens live in one table; lookups differ only in
/// the validity cutoff supplied by the caller.
#[async_trait]
pub trait SessionTokenRepository: Send + Sync {
    /// Insert the session/remember-me token pair created at login
    async fn create_pair(
        &self,
        user_id: Uuid,
        session_token: &str,
        remember_token: &str,
    ) -> DbResult<()>;

    /// Resolve a token whose `updated_at` is after `cutoff`
    async fn resolve(&self, token: &str, cutoff: DateTime<Utc>) -> DbResult<Option<SessionTokenRow>>;

    /// Slide the token's `updated_at` forward to now
    async fn touch(&self, token: &str) -> DbResult<()>;

    /// Delete the row for this token; returns affected rows (0 is not an error)
    async fn delete_by_token(&self, token: &str) -> DbResult<u64>;
}

/// Group membership and activation repository trait
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Group ids the user belongs to, joined against the group table.
    ///
    /// May contain duplicates; the schema does not enforce membership
    /// uniqueness; callers dedupe.
    async fn group_ids_for_user(&self, user_id: Uuid) -> DbResult<Vec<Uuid>>;

    /// Insert a membership row; returns whether the insert succeeded.
    ///
    /// Does not check for an existing duplicate.
    async fn add_membership(&self, user_id: Uuid, group_id: Uuid) -> DbResult<bool>;

    /// Delete matching membership rows; zero matches is not an error
    async fn remove_membership(&self, user_id: Uuid, group_id: Uuid) -> DbResult<()>;

    /// Whether any membership row exists for this user and group
    async fn membership_exists(&self, user_id: Uuid, group_id: Uuid) -> DbResult<bool>;

    /// Find an activation token valid at `now` (`valid_from <= now <= valid_to`)
    async fn find_valid_activation_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Option<GroupActivationTokenRow>>;
}
