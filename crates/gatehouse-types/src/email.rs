//! Validated email addresses
//!
//! Every authentication path keys off an email address, so syntax validation
//! happens once, at the edge, before anything touches storage.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Rejects anything without a local part, an `@`, and a dotted domain.
/// Comparison stays case-sensitive: the store treats addresses as opaque
/// unique keys.
fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid"))
}

/// A syntactically valid email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parse and validate an email address.
    ///
    /// # Errors
    /// Returns [`EmailError::Invalid`] when the string is not a plausible
    /// address. Validation is a hard precondition for every login path.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if email_regex().is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(EmailError::Invalid(s.to_string()))
        }
    }

    /// The address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Errors from email parsing
#[derive(Debug, Clone, thiserror::Error)]
pub enum EmailError {
    #[error("invalid email address: {0:?}")]
    Invalid(String),
}
