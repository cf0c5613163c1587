//! PostgreSQL session token repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::SessionTokenRow;
use crate::repo::SessionTokenRepository;

/// PostgreSQL session token repository
#[derive(Clone)]
pub struct PgSessionTokenRepository {
    pool: PgPool,
    prefix: String,
}

impl PgSessionTokenRepository {
    /// Create a new session token repository
    pub fn new(pool: PgPool, prefix: String) -> Self {
        Self { pool, prefix }
    }

    fn session_tokens(&self) -> String {
        format!("{}session_tokens", self.prefix)
    }
}

#[async_trait]
impl SessionTokenRepository for PgSessionTokenRepository {
    async fn create_pair(
        &self,
        user_id: Uuid,
        session_token: &str,
        remember_token: &str,
    ) -> DbResult<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO {} (user_id, token)
            VALUES ($1, $2), ($1, $3)
            "#,
            self.session_tokens()
        ))
        .bind(user_id)
        .bind(session_token)
        .bind(remember_token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn resolve(
        &self,
        token: &str,
        cutoff: DateTime<Utc>,
    ) -> DbResult<Option<SessionTokenRow>> {
        let row = sqlx::query_as::<_, SessionTokenRow>(&format!(
            r#"
            SELECT user_id, token, created_at, updated_at
            FROM {}
            WHERE token = $1 AND updated_at > $2
            "#,
            self.session_tokens()
        ))
        .bind(token)
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn touch(&self, token: &str) -> DbResult<()> {
        sqlx::query(&format!(
            "UPDATE {} SET updated_at = NOW() WHERE token = $1",
            self.session_tokens()
        ))
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_by_token(&self, token: &str) -> DbResult<u64> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE token = $1",
            self.session_tokens()
        ))
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
