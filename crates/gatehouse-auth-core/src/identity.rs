//! Identity manager - the authentication state machine
//!
//! One instance handles exactly one logical authentication flow per inbound
//! request. State fields (email, role, user id, new-user flag) are populated
//! only as a side effect of successful operations; all durable state lives
//! behind the repository traits.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use gatehouse_db::{
    EmailTokenRepository, GroupRepository, SessionTokenRepository, UserRepository,
};
use gatehouse_types::{Email, GroupId, RoleId, UserId};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::groups::GroupAuthority;
use crate::session::SessionContext;
use crate::token::{email_token_cutoff, TokenGenerator, ValidityWindow};

/// Authentication state machine, request-scoped.
///
/// Orchestrates login by one-time email token, trusted-email (social) login,
/// session validation, remember-me renewal, and logout.
pub struct IdentityManager<U, T, S, G>
where
    U: UserRepository,
    T: EmailTokenRepository,
    S: SessionTokenRepository,
    G: GroupRepository,
{
    config: AuthConfig,
    users: Arc<U>,
    email_tokens: Arc<T>,
    session_tokens: Arc<S>,
    groups: GroupAuthority<G>,
    token_generator: TokenGenerator,

    authenticated: bool,
    is_new_user: Option<bool>,
    email: Option<Email>,
    role_id: Option<RoleId>,
    user_id: Option<UserId>,
}

impl<U, T, S, G> IdentityManager<U, T, S, G>
where
    U: UserRepository,
    T: EmailTokenRepository,
    S: SessionTokenRepository,
    G: GroupRepository,
{
    /// Create a new identity manager over the given repositories
    pub fn new(
        config: AuthConfig,
        users: Arc<U>,
        email_tokens: Arc<T>,
        session_tokens: Arc<S>,
        groups: Arc<G>,
    ) -> Self {
        Self {
            config,
            users,
            email_tokens,
            session_tokens,
            groups: GroupAuthority::new(groups),
            token_generator: TokenGenerator,
            authenticated: false,
            is_new_user: None,
            email: None,
            role_id: None,
            user_id: None,
        }
    }

    /// The configuration this manager was built with
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// The group authority backing [`Self::groups`]
    pub fn group_authority(&self) -> &GroupAuthority<G> {
        &self.groups
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Start a login for `email`: resolve or create the user, then issue a
    /// one-time login token bound to the address.
    ///
    /// Validation is a hard precondition: a malformed address is rejected
    /// before any query runs. Does not create a session; the returned token
    /// is redeemed later via [`Self::is_token_valid`].
    ///
    /// # Errors
    /// `Validation` for a malformed address, `Storage` when the store fails.
    pub async fn login(&mut self, email: &str) -> Result<String, AuthError> {
        let email = Email::parse(email).map_err(|e| AuthError::Validation(e.to_string()))?;

        let (_user, created) = self.users.create_if_absent(email.as_str()).await?;
        self.is_new_user = Some(created);

        let token = self.token_generator.generate();
        self.email_tokens.create(email.as_str(), &token).await?;
        tracing::debug!(new_user = created, "login token issued");

        Ok(token)
    }

    /// Log in an email whose authenticity was already established upstream
    /// (a social identity resolver verified it against its provider).
    ///
    /// Skips the email-token step entirely and populates a session right
    /// away. No re-verification happens here; the caller is responsible for
    /// having verified the identity.
    pub async fn login_with_trusted_email(
        &mut self,
        email: &str,
        ctx: &mut dyn SessionContext,
    ) -> Result<(), AuthError> {
        let email = Email::parse(email).map_err(|e| AuthError::Validation(e.to_string()))?;

        let (_user, created) = self.users.create_if_absent(email.as_str()).await?;
        self.is_new_user = Some(created);

        self.populate_session_by_email(&email, ctx).await
    }

    /// Redeem a one-time email login token.
    ///
    /// An unknown or expired token returns `Ok(false)` with no side effect.
    /// A valid token is consumed atomically (a concurrent redemption of the
    /// same token cannot also succeed), the user's last login is stamped,
    /// state is populated, and a fresh session/remember-me pair is created.
    pub async fn is_token_valid(
        &mut self,
        email_token: &str,
        ctx: &mut dyn SessionContext,
    ) -> Result<bool, AuthError> {
        let cutoff = email_token_cutoff(Utc::now());
        let Some(row) = self.email_tokens.consume_valid(email_token, cutoff).await? else {
            tracing::debug!("unknown or expired login token");
            return Ok(false);
        };

        self.users.touch_last_login(&row.email).await?;

        let email = Email::parse(&row.email)
            .map_err(|e| AuthError::Internal(format!("stored email unparsable: {e}")))?;
        self.populate_session_by_email(&email, ctx).await?;

        Ok(true)
    }

    // =========================================================================
    // Session validation
    // =========================================================================

    /// Determine whether the caller holds a live session.
    ///
    /// No session token in the context means not authenticated (no store
    /// access). A resolvable token slides its `updated_at` forward and
    /// populates email/role/user id from the user row; no new session is
    /// created.
    pub async fn is_authenticated(
        &mut self,
        ctx: &mut dyn SessionContext,
    ) -> Result<bool, AuthError> {
        let Some(session_token) = ctx.session_token() else {
            self.authenticated = false;
            return Ok(false);
        };

        match self
            .resolve_session_user(&session_token, self.config.session_window())
            .await?
        {
            Some(user_id) => {
                self.populate_user_by_id(user_id).await?;
                self.authenticated = true;
            }
            None => self.authenticated = false,
        }

        Ok(self.authenticated)
    }

    /// Attempt an automatic re-login from the remember-me cookie.
    ///
    /// Fails closed when the transport is not confirmed secure, regardless
    /// of cookie validity. On success the old token is deleted and a brand
    /// new session/remember-me pair is created, so a stolen cookie is good
    /// for at most one use.
    pub async fn do_you_remember_me(
        &mut self,
        ctx: &mut dyn SessionContext,
    ) -> Result<bool, AuthError> {
        if !ctx.is_secure_transport() {
            tracing::warn!("remember-me token ignored: transport not confirmed secure");
            return Ok(false);
        }

        let Some(cookie_token) = ctx.remember_me_cookie() else {
            return Ok(false);
        };

        let Some(user_id) = self
            .resolve_session_user(&cookie_token, self.config.remember_me_window())
            .await?
        else {
            return Ok(false);
        };

        // Rotate: the redeemed token must never resolve again
        self.session_tokens.delete_by_token(&cookie_token).await?;
        self.create_session(user_id, ctx).await?;

        Ok(true)
    }

    /// End the current session.
    ///
    /// Requires an active session token in the context (`State` error
    /// otherwise; check [`Self::is_authenticated`] first). Deletes the
    /// session row, clears the session token, and when a remember-me cookie
    /// is present deletes its row and expires the cookie.
    pub async fn logout(&mut self, ctx: &mut dyn SessionContext) -> Result<(), AuthError> {
        let Some(session_token) = ctx.session_token() else {
            return Err(AuthError::State("logout requires an active session"));
        };

        self.session_tokens.delete_by_token(&session_token).await?;
        ctx.clear_session_token();

        if let Some(cookie_token) = ctx.remember_me_cookie() {
            self.session_tokens.delete_by_token(&cookie_token).await?;
            ctx.clear_remember_me_cookie(&self.config.remember_me_cookie_attributes());
        }

        self.authenticated = false;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The authenticated user's email.
    ///
    /// # Errors
    /// `State` unless a successful authentication path populated it.
    pub fn email(&self) -> Result<&Email, AuthError> {
        self.email
            .as_ref()
            .ok_or(AuthError::State("email not populated; authenticate first"))
    }

    /// The authenticated user's role id
    pub fn role_id(&self) -> Result<RoleId, AuthError> {
        self.role_id
            .ok_or(AuthError::State("role not populated; authenticate first"))
    }

    /// The authenticated user's id
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.user_id
            .ok_or(AuthError::State("user id not populated; authenticate first"))
    }

    /// Whether the last login attempt was for a previously unseen email.
    ///
    /// Tri-state: unknown until a login path ran in this request.
    pub fn is_new_user(&self) -> Result<bool, AuthError> {
        self.is_new_user
            .ok_or(AuthError::State("new-user flag not populated; log in first"))
    }

    /// Group ids the authenticated user belongs to, as a deduplicated set
    pub async fn groups(&self) -> Result<BTreeSet<GroupId>, AuthError> {
        let user_id = self.user_id()?;
        self.groups.groups_by_user_id(user_id).await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Sliding-window session lookup shared by `is_authenticated` and
    /// `do_you_remember_me`: resolve the token against the window's cutoff
    /// and slide `updated_at` forward on a match.
    ///
    /// The refresh is unconditional: every successful validation writes,
    /// even when the previous update was seconds ago. Refreshing only past a
    /// staleness threshold would cut write load and is deliberately left out
    /// for now.
    async fn resolve_session_user(
        &self,
        token: &str,
        window: ValidityWindow,
    ) -> Result<Option<UserId>, AuthError> {
        let cutoff = window.cutoff(Utc::now());
        let Some(row) = self.session_tokens.resolve(token, cutoff).await? else {
            return Ok(None);
        };

        self.session_tokens.touch(token).await?;
        Ok(Some(row.user_id()))
    }

    /// Populate state for the user with this email and open a session.
    async fn populate_session_by_email(
        &mut self,
        email: &Email,
        ctx: &mut dyn SessionContext,
    ) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_email(email.as_str())
            .await?
            .ok_or_else(|| AuthError::Internal("existing user expected".to_string()))?;

        self.email = Some(email.clone());
        self.role_id = Some(user.role_id());
        self.user_id = Some(user.user_id());

        self.create_session(user.user_id(), ctx).await
    }

    /// Populate state for the user with this id. Does not create a session.
    async fn populate_user_by_id(&mut self, user_id: UserId) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_id(user_id.0)
            .await?
            .ok_or_else(|| AuthError::Internal("existing user expected".to_string()))?;

        let email = Email::parse(&user.email)
            .map_err(|e| AuthError::Internal(format!("stored email unparsable: {e}")))?;

        self.email = Some(email);
        self.role_id = Some(user.role_id());
        self.user_id = Some(user_id);
        Ok(())
    }

    /// Create a session/remember-me token pair and hand both to the caller's
    /// context: the session token into the session, the remember-me token
    /// into its persistent cookie.
    async fn create_session(
        &mut self,
        user_id: UserId,
        ctx: &mut dyn SessionContext,
    ) -> Result<(), AuthError> {
        let session_token = self.token_generator.generate();
        let remember_token = self.token_generator.generate();

        self.session_tokens
            .create_pair(user_id.0, &session_token, &remember_token)
            .await?;

        ctx.set_session_token(&session_token);
        ctx.set_remember_me_cookie(
            &remember_token,
            &self.config.remember_me_cookie_attributes(),
        );

        Ok(())
    }
}

impl<U, T, S, G> std::fmt::Debug for IdentityManager<U, T, S, G>
where
    U: UserRepository,
    T: EmailTokenRepository,
    S: SessionTokenRepository,
    G: GroupRepository,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityManager")
            .field("authenticated", &self.authenticated)
            .field("is_new_user", &self.is_new_user)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}
