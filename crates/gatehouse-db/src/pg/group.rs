//! PostgreSQL group membership repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::error::ErrorKind;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::GroupActivationTokenRow;
use crate::repo::GroupRepository;

/// PostgreSQL group membership and activation repository
#[derive(Clone)]
pub struct PgGroupRepository {
    pool: PgPool,
    prefix: String,
}

impl PgGroupRepository {
    /// Create a new group repository
    pub fn new(pool: PgPool, prefix: String) -> Self {
        Self { pool, prefix }
    }

    fn groups(&self) -> String {
        format!("{}groups", self.prefix)
    }

    fn user_groups(&self) -> String {
        format!("{}user_groups", self.prefix)
    }

    fn activation_tokens(&self) -> String {
        format!("{}group_activation_tokens", self.prefix)
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    async fn group_ids_for_user(&self, user_id: Uuid) -> DbResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(&format!(
            r#"
            SELECT ug.group_id
            FROM {} g
            INNER JOIN {} ug ON g.id = ug.group_id
            WHERE ug.user_id = $1
            "#,
            self.groups(),
            self.user_groups()
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn add_membership(&self, user_id: Uuid, group_id: Uuid) -> DbResult<bool> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (id, user_id, group_id) VALUES ($1, $2, $3)",
            self.user_groups()
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(group_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() == 1),
            // A constraint violation (e.g. the group id does not exist) is a
            // failed insert, not a storage outage.
            Err(sqlx::Error::Database(db)) if !matches!(db.kind(), ErrorKind::Other) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_membership(&self, user_id: Uuid, group_id: Uuid) -> DbResult<()> {
        sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = $1 AND group_id = $2",
            self.user_groups()
        ))
        .bind(user_id)
        .bind(group_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn membership_exists(&self, user_id: Uuid, group_id: Uuid) -> DbResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = $1 AND group_id = $2)",
            self.user_groups()
        ))
        .bind(user_id)
        .bind(group_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_valid_activation_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Option<GroupActivationTokenRow>> {
        let row = sqlx::query_as::<_, GroupActivationTokenRow>(&format!(
            r#"
            SELECT id, created_at, group_id, valid_from, valid_to, token
            FROM {}
            WHERE token = $1 AND valid_from <= $2 AND valid_to >= $2
            "#,
            self.activation_tokens()
        ))
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
