//! Login flow result records
//!
//! The core is invoked as a library by a request-handling layer that passes
//! in the parsed method, query parameters, and form fields, and gets back a
//! small result record to render or act on. This module owns that decision
//! tree; routing and templating stay outside.

use std::sync::Arc;

use gatehouse_db::{
    EmailTokenRepository, GroupRepository, SessionTokenRepository, UserRepository,
};
use gatehouse_types::Email;

use crate::error::AuthError;
use crate::forgery::AntiForgery;
use crate::identity::IdentityManager;
use crate::mail::{LoginMailer, MailTransport};
use crate::session::SessionContext;
use crate::social::resolver_for;

/// HTTP method of the inbound request, as parsed by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Parsed inbound request for the login page flow
#[derive(Debug, Clone, Default)]
pub struct FlowRequest {
    /// One-time email token from the login URL, when present
    pub token: Option<String>,
    /// Whether the logout query flag was set
    pub logout: bool,
    /// Posted email address, when present
    pub email: Option<String>,
    /// Posted anti-forgery token, when present
    pub forgery_token: Option<String>,
}

impl FlowRequest {
    /// A GET request carrying a login token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::default()
        }
    }

    /// A POST request carrying the login form fields
    pub fn with_login_form(
        email: impl Into<String>,
        forgery_token: impl Into<String>,
    ) -> Self {
        Self {
            email: Some(email.into()),
            forgery_token: Some(forgery_token.into()),
            ..Self::default()
        }
    }
}

/// Result record handed back to the request-handling layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Redirect the client to this URL
    Redirect { url: String },
    /// Render the login page in this state
    Page {
        show_login: bool,
        show_logout: bool,
        message: String,
    },
}

/// Outcome of a social login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocialLoginOutcome {
    /// Logged in via the named provider
    Success { provider: String },
    /// The bearer token was missing or empty
    MissingCredentials,
    /// The provider discriminator is not supported
    UnsupportedProvider,
    /// The provider did not verify the token into an email claim
    InvalidToken,
    /// The verified email did not produce an authenticated session
    LoginFailed,
}

impl SocialLoginOutcome {
    /// HTTP status the boundary layer should answer with
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Success { .. } => 200,
            Self::MissingCredentials | Self::UnsupportedProvider => 401,
            Self::InvalidToken => 403,
            Self::LoginFailed => 500,
        }
    }

    /// Human-readable message for the boundary layer
    pub fn message(&self) -> String {
        match self {
            Self::Success { provider } => format!("Login successful - {provider}"),
            Self::MissingCredentials => "Missing or invalid auth token".to_string(),
            Self::UnsupportedProvider => "Unsupported provider".to_string(),
            Self::InvalidToken => "Invalid ID token".to_string(),
            Self::LoginFailed => "Internal login failed".to_string(),
        }
    }
}

/// Drives one login-page or social-login interaction per request.
pub struct LoginFlow<U, T, S, G>
where
    U: UserRepository,
    T: EmailTokenRepository,
    S: SessionTokenRepository,
    G: GroupRepository,
{
    identity: IdentityManager<U, T, S, G>,
    mailer: LoginMailer,
    forgery: AntiForgery,
}

impl<U, T, S, G> LoginFlow<U, T, S, G>
where
    U: UserRepository,
    T: EmailTokenRepository,
    S: SessionTokenRepository,
    G: GroupRepository,
{
    /// Create a flow from an identity manager and the mail transport
    pub fn new(
        identity: IdentityManager<U, T, S, G>,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, AuthError> {
        let config = identity.config().clone();
        let forgery = AntiForgery::new(&config.forgery_secret)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok(Self {
            identity,
            mailer: LoginMailer::new(config, transport),
            forgery,
        })
    }

    /// The underlying identity manager
    pub fn identity(&self) -> &IdentityManager<U, T, S, G> {
        &self.identity
    }

    /// The underlying identity manager, mutable
    pub fn identity_mut(&mut self) -> &mut IdentityManager<U, T, S, G> {
        &mut self.identity
    }

    /// Issue an anti-forgery token for the login form
    pub fn issue_forgery_token(&self) -> String {
        self.forgery.issue()
    }

    /// Handle one login-page request.
    ///
    /// # Errors
    /// `Validation` for a request shape the flow does not understand (e.g. a
    /// POST without the expected form fields); `Storage` is passed through.
    pub async fn handle(
        &mut self,
        method: HttpMethod,
        request: FlowRequest,
        ctx: &mut dyn SessionContext,
    ) -> Result<FlowOutcome, AuthError> {
        if self.identity.is_authenticated(ctx).await? {
            if request.logout {
                self.identity.logout(ctx).await?;
                return Ok(FlowOutcome::Redirect {
                    url: self.user_route_url(),
                });
            }
            let email = self.identity.email()?.clone();
            return Ok(FlowOutcome::Page {
                show_login: false,
                show_logout: true,
                message: format!("You are already signed in as {email}."),
            });
        }

        match method {
            HttpMethod::Get => self.handle_get(request, ctx).await,
            HttpMethod::Post => self.handle_post(request, ctx).await,
        }
    }

    async fn handle_get(
        &mut self,
        request: FlowRequest,
        ctx: &mut dyn SessionContext,
    ) -> Result<FlowOutcome, AuthError> {
        if let Some(token) = request.token {
            if self.identity.is_token_valid(&token, ctx).await? {
                return Ok(FlowOutcome::Redirect {
                    url: self.user_route_url(),
                });
            }
            return Ok(FlowOutcome::Page {
                show_login: true,
                show_logout: false,
                message: "Invalid token.".to_string(),
            });
        }

        if self.identity.do_you_remember_me(ctx).await? {
            tracing::debug!("auto re-login via remember-me token");
            return Ok(FlowOutcome::Redirect {
                url: self.user_route_url(),
            });
        }

        Ok(FlowOutcome::Page {
            show_login: true,
            show_logout: false,
            message: "Sign in: a login link will be sent to your email address. \
                      No passwords needed."
                .to_string(),
        })
    }

    async fn handle_post(
        &mut self,
        request: FlowRequest,
        _ctx: &mut dyn SessionContext,
    ) -> Result<FlowOutcome, AuthError> {
        let (Some(email), Some(forgery_token)) = (request.email, request.forgery_token) else {
            return Err(AuthError::Validation(
                "email and anti-forgery token are required".to_string(),
            ));
        };

        let parsed = match Email::parse(&email) {
            Ok(parsed) => parsed,
            Err(_) => {
                return Ok(FlowOutcome::Page {
                    show_login: true,
                    show_logout: false,
                    message: "Invalid email format.".to_string(),
                })
            }
        };

        if !self.forgery.verify(&forgery_token) {
            tracing::error!("anti-forgery token mismatch");
            return Ok(FlowOutcome::Page {
                show_login: true,
                show_logout: false,
                message: "Token mismatch.".to_string(),
            });
        }

        let token = self.identity.login(parsed.as_str()).await?;
        let new_user = self.identity.is_new_user()?;
        self.mailer.send_login_email(&parsed, &token, new_user).await?;

        Ok(FlowOutcome::Page {
            show_login: false,
            show_logout: false,
            message: "A sign-in link is on its way to your email. Follow it to log in; \
                      no passwords needed."
                .to_string(),
        })
    }

    /// Handle one social-login request.
    ///
    /// An existing login is overridden: any authenticated session is logged
    /// out before the provider token is resolved.
    pub async fn social_login(
        &mut self,
        provider: &str,
        auth_token: &str,
        ctx: &mut dyn SessionContext,
    ) -> Result<SocialLoginOutcome, AuthError> {
        if auth_token.is_empty() {
            return Ok(SocialLoginOutcome::MissingCredentials);
        }

        if self.identity.is_authenticated(ctx).await? {
            self.identity.logout(ctx).await?;
        }

        let Some(resolver) = resolver_for(provider, self.identity.config()) else {
            tracing::warn!(provider, "unsupported social login provider");
            return Ok(SocialLoginOutcome::UnsupportedProvider);
        };

        let Some(claim) = resolver.auth_token_to_email(auth_token).await else {
            tracing::error!(provider, "social auth token did not verify");
            return Ok(SocialLoginOutcome::InvalidToken);
        };

        self.identity
            .login_with_trusted_email(&claim.email, ctx)
            .await?;

        if self.identity.is_authenticated(ctx).await? {
            Ok(SocialLoginOutcome::Success {
                provider: provider.to_string(),
            })
        } else {
            Ok(SocialLoginOutcome::LoginFailed)
        }
    }

    fn user_route_url(&self) -> String {
        format!(
            "{}/user",
            self.identity.config().app_root_url.trim_end_matches('/')
        )
    }
}
