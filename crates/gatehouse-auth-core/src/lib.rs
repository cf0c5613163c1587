//! Gatehouse Auth Core - Passwordless authentication business logic
//!
//! Core authentication functionality: one-time email login tokens, session
//! and remember-me persistence with sliding validity windows, trusted-email
//! (social) login, and group-membership authorization.

pub mod config;
pub mod crypto;
pub mod error;
pub mod flow;
pub mod forgery;
pub mod groups;
pub mod identity;
pub mod mail;
pub mod session;
pub mod social;
pub mod token;

pub use config::{AuthConfig, ConfigError};
pub use crypto::{constant_time_eq, HmacKey, HmacKeyError};
pub use error::AuthError;
pub use flow::{FlowOutcome, FlowRequest, HttpMethod, LoginFlow, SocialLoginOutcome};
pub use forgery::AntiForgery;
pub use groups::GroupAuthority;
pub use identity::IdentityManager;
pub use mail::{LoginMailer, MailTransport, SmtpMailer, URL_PLACEHOLDER};
pub use session::{
    CookieAttributes, SessionContext, REMEMBER_ME_COOKIE, REMEMBER_ME_MAX_AGE_SECONDS,
    SESSION_TOKEN_KEY,
};
pub use social::{
    resolver_for, verification_client, EmailClaim, FacebookResolver, GoogleResolver,
    SocialIdentityResolver,
};
pub use token::{
    email_token_cutoff, TokenGenerator, ValidityWindow, EMAIL_TOKEN_VALID_MINUTES,
    REMEMBER_ME_VALID_DAYS, SESSION_VALID_DAYS,
};
