//! PostgreSQL repository implementations
//!
//! Every query applies the configured table prefix (multi-tenant schema
//! isolation); values are always bound as parameters, never formatted into
//! the query text.

mod email_token;
mod group;
mod session_token;
mod user;

pub use email_token::PgEmailTokenRepository;
pub use group::PgGroupRepository;
pub use session_token::PgSessionTokenRepository;
pub use user::PgUserRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub users: PgUserRepository,
    pub email_tokens: PgEmailTokenRepository,
    pub session_tokens: PgSessionTokenRepository,
    pub groups: PgGroupRepository,
}

impl Repositories {
    /// Create all repositories from a database pool and table prefix.
    ///
    /// Pass an empty prefix when tables are not namespaced.
    pub fn new(pool: DbPool, table_prefix: impl Into<String>) -> Self {
        let prefix = table_prefix.into();
        Self {
            users: PgUserRepository::new(pool.clone(), prefix.clone()),
            email_tokens: PgEmailTokenRepository::new(pool.clone(), prefix.clone()),
            session_tokens: PgSessionTokenRepository::new(pool.clone(), prefix.clone()),
            groups: PgGroupRepository::new(pool, prefix),
        }
    }
}
