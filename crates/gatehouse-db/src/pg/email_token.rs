//! PostgreSQL email token repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::EmailTokenRow;
use crate::repo::EmailTokenRepository;

/// PostgreSQL one-time email token repository
#[derive(Clone)]
pub struct PgEmailTokenRepository {
    pool: PgPool,
    prefix: String,
}

impl PgEmailTokenRepository {
    /// Create a new email token repository
    pub fn new(pool: PgPool, prefix: String) -> Self {
        Self { pool, prefix }
    }

    fn email_tokens(&self) -> String {
        format!("{}email_tokens", self.prefix)
    }
}

#[async_trait]
impl EmailTokenRepository for PgEmailTokenRepository {
    async fn create(&self, email: &str, token: &str) -> DbResult<EmailTokenRow> {
        let row = sqlx::query_as::<_, EmailTokenRow>(&format!(
            r#"
            INSERT INTO {} (id, email, token)
            VALUES ($1, $2, $3)
            RETURNING id, email, token, created_at
            "#,
            self.email_tokens()
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn consume_valid(
        &self,
        token: &str,
        cutoff: DateTime<Utc>,
    ) -> DbResult<Option<EmailTokenRow>> {
        // Single conditional DELETE: of two concurrent redemptions at most
        // one statement returns the row.
        let row = sqlx::query_as::<_, EmailTokenRow>(&format!(
            r#"
            DELETE FROM {}
            WHERE token = $1 AND created_at > $2
            RETURNING id, email, token, created_at
            "#,
            self.email_tokens()
        ))
        .bind(token)
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE created_at < $1",
            self.email_tokens()
        ))
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
