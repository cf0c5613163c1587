//! Gatehouse DB - Credential store abstractions
//!
//! SQLx-based persistence layer over users, roles, groups, email login
//! tokens, and session tokens.
//!
//! # Example
//!
//! ```rust,ignore
//! use gatehouse_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/gatehouse").await?;
//! let repos = Repositories::new(pool, "gh_");
//!
//! let user = repos.users.find_by_email("user@example.com").await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, DbPool};
pub use repo::*;
