//! Group authority - membership queries and activation-code redemption

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gatehouse_db::GroupRepository;
use gatehouse_types::{ActivationResult, GroupId, UserId};
use moka::future::Cache;

use crate::error::AuthError;

/// Group membership authority with a short-lived per-user cache.
///
/// Membership answers feed authorization checks on every request, so reads
/// go through a TTL cache; every mutation invalidates the affected user.
/// The activation state machine reads the store directly: its outcome must
/// reflect current contents at call time.
#[derive(Clone)]
pub struct GroupAuthority<R: GroupRepository> {
    repo: Arc<R>,
    /// Cache of user id -> deduplicated group set
    membership_cache: Cache<uuid::Uuid, Arc<BTreeSet<GroupId>>>,
}

impl<R: GroupRepository> GroupAuthority<R> {
    /// Create a new group authority
    pub fn new(repo: Arc<R>) -> Self {
        Self::with_cache_duration(repo, Duration::from_secs(60))
    }

    /// Create with a custom cache TTL
    pub fn with_cache_duration(repo: Arc<R>, cache_duration: Duration) -> Self {
        Self {
            repo,
            membership_cache: Cache::builder()
                .time_to_live(cache_duration)
                .max_capacity(10_000)
                .build(),
        }
    }

    /// Group ids the user belongs to.
    ///
    /// Returned as a set: the schema permits duplicate membership rows, so
    /// the raw rows are deduplicated here. Empty set when the user belongs
    /// to no group.
    pub async fn groups_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<BTreeSet<GroupId>, AuthError> {
        if let Some(cached) = self.membership_cache.get(&user_id.0).await {
            return Ok(cached.as_ref().clone());
        }

        let ids = self.repo.group_ids_for_user(user_id.0).await?;
        let set: BTreeSet<GroupId> = ids.into_iter().map(GroupId).collect();

        self.membership_cache
            .insert(user_id.0, Arc::new(set.clone()))
            .await;

        Ok(set)
    }

    /// Insert a membership row; returns whether the insert succeeded.
    ///
    /// Does not check for an existing duplicate; intended for payment
    /// callbacks and admin paths that know what they are doing.
    pub async fn add_user_to_group(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Result<bool, AuthError> {
        let inserted = self.repo.add_membership(user_id.0, group_id.0).await?;
        if inserted {
            self.invalidate(user_id).await;
        }
        Ok(inserted)
    }

    /// Remove the user from a group. Zero matching rows is not an error;
    /// only a failing statement raises. Admin action.
    pub async fn remove_user_from_group(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Result<(), AuthError> {
        self.repo.remove_membership(user_id.0, group_id.0).await?;
        self.invalidate(user_id).await;
        Ok(())
    }

    /// Redeem a group activation code for the user.
    ///
    /// Pure function of current store contents: no state between calls, no
    /// locking; two rapid calls may race. Outcome:
    /// - `WrongToken`: no token row matches within `[valid_from, valid_to]`
    /// - `AlreadyActivated`: a membership row already exists
    /// - `New`: membership created
    /// - `Failed`: the insert was attempted but did not succeed
    pub async fn activate_group_by_token(
        &self,
        user_id: UserId,
        token: &str,
    ) -> Result<ActivationResult, AuthError> {
        let now = Utc::now();
        let Some(activation) = self.repo.find_valid_activation_token(token, now).await? else {
            tracing::debug!("activation token unknown or outside validity window");
            return Ok(ActivationResult::WrongToken);
        };

        if self
            .repo
            .membership_exists(user_id.0, activation.group_id)
            .await?
        {
            return Ok(ActivationResult::AlreadyActivated);
        }

        if self
            .repo
            .add_membership(user_id.0, activation.group_id)
            .await?
        {
            self.invalidate(user_id).await;
            Ok(ActivationResult::New)
        } else {
            tracing::warn!(group_id = %activation.group_id, "group activation insert failed");
            Ok(ActivationResult::Failed)
        }
    }

    /// Drop the cached membership set for a user
    pub async fn invalidate(&self, user_id: UserId) {
        self.membership_cache.invalidate(&user_id.0).await;
    }
}

impl<R: GroupRepository> std::fmt::Debug for GroupAuthority<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupAuthority").finish()
    }
}
