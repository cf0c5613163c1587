//! Per-request session and cookie context
//!
//! The core never reads ambient process-wide state: the request-handling
//! layer hands every operation an explicit [`SessionContext`] scoped to the
//! current request. That keeps the identity manager deterministic under
//! test and makes the transport trust decision the caller's to assert.

/// Key under which the caller stores the active session token
pub const SESSION_TOKEN_KEY: &str = "gh_session_token";
/// Name of the persistent remember-me cookie
pub const REMEMBER_ME_COOKIE: &str = "gh_remember_me";

/// Remember-me cookie lifetime in seconds (30 days)
pub const REMEMBER_ME_MAX_AGE_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Attributes applied when setting or expiring the remember-me cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    /// Cookie path
    pub path: String,
    /// Cookie domain ("" = host-default)
    pub domain: String,
    /// Send only over a secure channel
    pub secure: bool,
    /// Hide from client-side scripts
    pub http_only: bool,
    /// Lifetime in seconds from now
    pub max_age_seconds: i64,
}

impl CookieAttributes {
    /// Attributes for the persistent remember-me cookie
    pub fn remember_me(path: &str, domain: &str) -> Self {
        Self {
            path: path.to_string(),
            domain: domain.to_string(),
            secure: true,
            http_only: true,
            max_age_seconds: REMEMBER_ME_MAX_AGE_SECONDS,
        }
    }
}

/// Per-request session and cookie access, supplied by the caller.
///
/// The session token value is owned by the caller's session mechanism (a
/// cookie-backed store, a framework session, a test double); the core only
/// gets, sets, and clears a single string through it.
pub trait SessionContext: Send {
    /// The active session token, if any
    fn session_token(&self) -> Option<String>;

    /// Store the session token for this request's session
    fn set_session_token(&mut self, token: &str);

    /// Remove the session token from this request's session
    fn clear_session_token(&mut self);

    /// The remember-me cookie value, if the request carried one
    fn remember_me_cookie(&self) -> Option<String>;

    /// Set the remember-me cookie with the given attributes
    fn set_remember_me_cookie(&mut self, token: &str, attributes: &CookieAttributes);

    /// Expire the remember-me cookie immediately
    fn clear_remember_me_cookie(&mut self, attributes: &CookieAttributes);

    /// Whether the surrounding transport is confirmed secure.
    ///
    /// Remember-me tokens are honored only when this returns true.
    fn is_secure_transport(&self) -> bool;
}
