//! Mail dispatch boundary
//!
//! The core only triggers delivery and owns the token-substitution contract;
//! transport is a collaborator behind [`MailTransport`]. Whether a message
//! actually leaves the building is gated by an externally-owned flag.

use async_trait::async_trait;
use gatehouse_types::Email;
use lettre::message::Mailbox;
use lettre::transport::smtp::AsyncSmtpTransport;
use lettre::{Address, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Placeholder replaced with the login URL in email templates
pub const URL_PLACEHOLDER: &str = "%URL%";

/// Outbound mail transport contract
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver a plain-text message
    async fn send(&self, to: &Email, subject: &str, text_body: &str) -> Result<(), AuthError>;
}

/// SMTP transport over lettre
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build an SMTP mailer from the configured relay and From address
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let address = config
            .mail_from
            .parse::<Address>()
            .map_err(|e| AuthError::Internal(format!("invalid From address: {e}")))?;
        let from = Mailbox::new(config.mail_from_name.clone(), address);

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
            .port(config.smtp_port)
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, to: &Email, subject: &str, text_body: &str) -> Result<(), AuthError> {
        let to_address = to
            .as_str()
            .parse::<Address>()
            .map_err(|e| AuthError::Internal(format!("invalid recipient address: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(None, to_address))
            .subject(subject)
            .body(text_body.to_string())
            .map_err(|e| AuthError::Internal(format!("failed to build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AuthError::Internal(format!("smtp send failed: {e}")))?;

        tracing::info!(from = %self.from, %to, %subject, "mail sent");
        Ok(())
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

/// Sends the login/registration email carrying the token-bearing URL.
pub struct LoginMailer {
    config: AuthConfig,
    transport: Arc<dyn MailTransport>,
}

impl LoginMailer {
    /// Create a login mailer over the given transport
    pub fn new(config: AuthConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self { config, transport }
    }

    /// The URL a recipient follows to redeem the token
    pub fn login_url(&self, token: &str) -> String {
        format!(
            "{}/user/?token={}",
            self.config.app_root_url.trim_end_matches('/'),
            token
        )
    }

    /// Send the login (or, for a new user, registration) email.
    ///
    /// Substitutes the login URL for `%URL%` in the configured template.
    /// When mail delivery is disabled by configuration the message is
    /// logged and dropped; that flag is owned outside this core.
    pub async fn send_login_email(
        &self,
        to: &Email,
        token: &str,
        new_user: bool,
    ) -> Result<(), AuthError> {
        let url = self.login_url(token);
        let (subject, template) = if new_user {
            (
                &self.config.subject_email_registration,
                &self.config.text_email_registration,
            )
        } else {
            (&self.config.subject_email_login, &self.config.text_email_login)
        };
        let body = template.replace(URL_PLACEHOLDER, &url);

        if !self.config.mail_enabled {
            tracing::warn!(%to, %subject, "mail delivery disabled by configuration, not sending");
            return Ok(());
        }

        self.transport.send(to, subject, &body).await
    }
}

impl std::fmt::Debug for LoginMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginMailer")
            .field("mail_enabled", &self.config.mail_enabled)
            .finish_non_exhaustive()
    }
}
