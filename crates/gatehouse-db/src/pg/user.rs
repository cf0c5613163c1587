//! PostgreSQL user repository implementation

use async_trait::async_trait;
use gatehouse_types::RoleId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::UserRow;
use crate::repo::UserRepository;

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
    prefix: String,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool, prefix: String) -> Self {
        Self { pool, prefix }
    }

    fn users(&self) -> String {
        format!("{}users", self.prefix)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT id, email, role_id, created_at, last_login_at
            FROM {}
            WHERE id = $1
            "#,
            self.users()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT id, email, role_id, created_at, last_login_at
            FROM {}
            WHERE email = $1
            "#,
            self.users()
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_if_absent(&self, email: &str) -> DbResult<(UserRow, bool)> {
        // ON CONFLICT DO NOTHING keyed on the unique email column keeps the
        // insert idempotent under concurrent first-login attempts.
        let inserted = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO {} (id, email, role_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, role_id, created_at, last_login_at
            "#,
            self.users()
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(RoleId::BASELINE.0)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok((row, true));
        }

        let existing = self.find_by_email(email).await?.ok_or(DbError::NotFound)?;
        Ok((existing, false))
    }

    async fn touch_last_login(&self, email: &str) -> DbResult<()> {
        sqlx::query(&format!(
            "UPDATE {} SET last_login_at = NOW() WHERE email = $1",
            self.users()
        ))
        .bind(email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
