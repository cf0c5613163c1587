//! Mock repositories for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use gatehouse_db::{
    DbResult, EmailTokenRepository, EmailTokenRow, GroupActivationTokenRow, GroupMembershipRow,
    GroupRepository, GroupRow, SessionTokenRepository, SessionTokenRow, UserRepository, UserRow,
};
use gatehouse_types::RoleId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// In-memory user repository for testing
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<Uuid, UserRow>>,
    by_email: Arc<DashMap<String, Uuid>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.users.get(id.value()).map(|r| r.value().clone())))
    }

    async fn create_if_absent(&self, email: &str) -> DbResult<(UserRow, bool)> {
        if let Some(existing) = self.find_by_email(email).await? {
            return Ok((existing, false));
        }
        let row = UserRow {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role_id: RoleId::BASELINE.0,
            created_at: Utc::now(),
            last_login_at: None,
        };
        self.by_email.insert(row.email.clone(), row.id);
        self.users.insert(row.id, row.clone());
        Ok((row, true))
    }

    async fn touch_last_login(&self, email: &str) -> DbResult<()> {
        if let Some(id) = self.by_email.get(email).map(|r| *r.value()) {
            if let Some(mut user) = self.users.get_mut(&id) {
                user.last_login_at = Some(Utc::now());
            }
        }
        Ok(())
    }
}

/// In-memory email token repository for testing
#[derive(Default, Clone)]
pub struct MockEmailTokenRepository {
    tokens: Arc<DashMap<String, EmailTokenRow>>,
}

impl MockEmailTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tokens
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Insert a token row directly, e.g. with a back-dated creation time
    #[allow(dead_code)]
    pub fn insert_token(&self, email: &str, token: &str, created_at: DateTime<Utc>) {
        self.tokens.insert(
            token.to_string(),
            EmailTokenRow {
                id: Uuid::new_v4(),
                email: email.to_string(),
                token: token.to_string(),
                created_at,
            },
        );
    }
}

#[async_trait]
impl EmailTokenRepository for MockEmailTokenRepository {
    async fn create(&self, email: &str, token: &str) -> DbResult<EmailTokenRow> {
        let row = EmailTokenRow {
            id: Uuid::new_v4(),
            email: email.to_string(),
            token: token.to_string(),
            created_at: Utc::now(),
        };
        self.tokens.insert(row.token.clone(), row.clone());
        Ok(row)
    }

    async fn consume_valid(
        &self,
        token: &str,
        cutoff: DateTime<Utc>,
    ) -> DbResult<Option<EmailTokenRow>> {
        // remove_if mirrors the conditional DELETE: removal and the window
        // check happen as one step
        Ok(self
            .tokens
            .remove_if(token, |_, row| row.created_at > cutoff)
            .map(|(_, row)| row))
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let before = self.tokens.len();
        self.tokens.retain(|_, row| row.created_at >= cutoff);
        Ok((before - self.tokens.len()) as u64)
    }
}

/// In-memory session token repository for testing
#[derive(Default, Clone)]
pub struct MockSessionTokenRepository {
    rows: Arc<DashMap<String, SessionTokenRow>>,
}

impl MockSessionTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a row exists for this token
    #[allow(dead_code)]
    pub fn contains_token(&self, token: &str) -> bool {
        self.rows.contains_key(token)
    }

    /// Number of stored rows
    #[allow(dead_code)]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Back-date a token's `updated_at`
    #[allow(dead_code)]
    pub fn set_updated_at(&self, token: &str, updated_at: DateTime<Utc>) {
        if let Some(mut row) = self.rows.get_mut(token) {
            row.updated_at = updated_at;
        }
    }

    /// Read a row back for assertions
    #[allow(dead_code)]
    pub fn get_row(&self, token: &str) -> Option<SessionTokenRow> {
        self.rows.get(token).map(|r| r.value().clone())
    }
}

#[async_trait]
impl SessionTokenRepository for MockSessionTokenRepository {
    async fn create_pair(
        &self,
        user_id: Uuid,
        session_token: &str,
        remember_token: &str,
    ) -> DbResult<()> {
        let now = Utc::now();
        for token in [session_token, remember_token] {
            self.rows.insert(
                token.to_string(),
                SessionTokenRow {
                    user_id,
                    token: token.to_string(),
                    created_at: now,
                    updated_at: now,
                },
            );
        }
        Ok(())
    }

    async fn resolve(
        &self,
        token: &str,
        cutoff: DateTime<Utc>,
    ) -> DbResult<Option<SessionTokenRow>> {
        Ok(self
            .rows
            .get(token)
            .filter(|row| row.updated_at > cutoff)
            .map(|row| row.value().clone()))
    }

    async fn touch(&self, token: &str) -> DbResult<()> {
        if let Some(mut row) = self.rows.get_mut(token) {
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_by_token(&self, token: &str) -> DbResult<u64> {
        Ok(u64::from(self.rows.remove(token).is_some()))
    }
}

/// In-memory group repository for testing
#[derive(Default, Clone)]
pub struct MockGroupRepository {
    groups: Arc<DashMap<Uuid, GroupRow>>,
    memberships: Arc<DashMap<Uuid, GroupMembershipRow>>,
    activation_tokens: Arc<DashMap<String, GroupActivationTokenRow>>,
    fail_inserts: Arc<AtomicBool>,
}

impl MockGroupRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group so the membership join can see it
    #[allow(dead_code)]
    pub fn insert_group(&self, id: Uuid, name_public: &str) {
        self.groups.insert(
            id,
            GroupRow {
                id,
                created_at: Utc::now(),
                name_public: name_public.to_string(),
                internal_notes: None,
            },
        );
    }

    /// Insert a membership row directly (duplicates allowed, as in the schema)
    #[allow(dead_code)]
    pub fn insert_membership(&self, user_id: Uuid, group_id: Uuid) {
        let id = Uuid::new_v4();
        self.memberships.insert(
            id,
            GroupMembershipRow {
                id,
                created_at: Utc::now(),
                user_id,
                group_id,
            },
        );
    }

    /// Register an activation token with an explicit validity window
    #[allow(dead_code)]
    pub fn insert_activation_token(
        &self,
        token: &str,
        group_id: Uuid,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
    ) {
        self.activation_tokens.insert(
            token.to_string(),
            GroupActivationTokenRow {
                id: Uuid::new_v4(),
                created_at: Utc::now(),
                group_id,
                valid_from,
                valid_to,
                token: token.to_string(),
            },
        );
    }

    /// Make subsequent membership inserts report failure
    #[allow(dead_code)]
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Raw membership row count for a user/group pair
    #[allow(dead_code)]
    pub fn membership_row_count(&self, user_id: Uuid, group_id: Uuid) -> usize {
        self.memberships
            .iter()
            .filter(|r| r.user_id == user_id && r.group_id == group_id)
            .count()
    }
}

#[async_trait]
impl GroupRepository for MockGroupRepository {
    async fn group_ids_for_user(&self, user_id: Uuid) -> DbResult<Vec<Uuid>> {
        // Inner join: only groups present in the group table come back
        Ok(self
            .memberships
            .iter()
            .filter(|r| r.user_id == user_id && self.groups.contains_key(&r.group_id))
            .map(|r| r.group_id)
            .collect())
    }

    async fn add_membership(&self, user_id: Uuid, group_id: Uuid) -> DbResult<bool> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.insert_membership(user_id, group_id);
        Ok(true)
    }

    async fn remove_membership(&self, user_id: Uuid, group_id: Uuid) -> DbResult<()> {
        self.memberships
            .retain(|_, r| !(r.user_id == user_id && r.group_id == group_id));
        Ok(())
    }

    async fn membership_exists(&self, user_id: Uuid, group_id: Uuid) -> DbResult<bool> {
        Ok(self
            .memberships
            .iter()
            .any(|r| r.user_id == user_id && r.group_id == group_id))
    }

    async fn find_valid_activation_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Option<GroupActivationTokenRow>> {
        Ok(self
            .activation_tokens
            .get(token)
            .filter(|row| row.valid_from <= now && row.valid_to >= now)
            .map(|row| row.value().clone()))
    }
}
