//! Configuration types for the authentication core

use crate::session::CookieAttributes;
use crate::token::{ValidityWindow, EMAIL_TOKEN_VALID_MINUTES, REMEMBER_ME_VALID_DAYS, SESSION_VALID_DAYS};

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Absolute application root URL (login links are built under it)
    pub app_root_url: String,
    /// Cookie path for the remember-me cookie
    pub cookie_path: String,
    /// Cookie domain ("" = host-default)
    pub cookie_domain: String,
    /// Session token validity in days (sliding)
    pub session_valid_days: i64,
    /// Remember-me token validity in days (sliding)
    pub remember_me_valid_days: i64,
    /// One-time email token validity in minutes (fixed from creation)
    pub email_token_valid_minutes: i64,
    /// HMAC secret for anti-forgery tokens (must be at least 32 bytes)
    pub forgery_secret: String,
    /// Google OAuth client id; social login via Google is off when unset
    pub google_client_id: Option<String>,
    /// Facebook app id; social login via Facebook is off when unset
    pub facebook_app_id: Option<String>,
    /// Whether login emails are actually delivered (externally owned flag)
    pub mail_enabled: bool,
    /// Default From address for outbound mail
    pub mail_from: String,
    /// Optional display name for the From address
    pub mail_from_name: Option<String>,
    /// SMTP relay host
    pub smtp_host: String,
    /// SMTP relay port
    pub smtp_port: u16,
    /// Subject of the login email
    pub subject_email_login: String,
    /// Subject of the registration email
    pub subject_email_registration: String,
    /// Body of the login email; `%URL%` is replaced with the login link
    pub text_email_login: String,
    /// Body of the registration email; `%URL%` is replaced with the login link
    pub text_email_registration: String,
}

impl AuthConfig {
    /// Create a config with defaults for everything but the root URL and
    /// anti-forgery secret.
    ///
    /// # Errors
    /// Returns an error when the secret is shorter than 32 bytes.
    pub fn try_new(
        app_root_url: impl Into<String>,
        forgery_secret: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let forgery_secret = forgery_secret.into();
        if forgery_secret.len() < 32 {
            return Err(ConfigError::Invalid(
                "forgery secret must be at least 32 bytes",
            ));
        }

        Ok(Self {
            app_root_url: app_root_url.into(),
            cookie_path: "/".to_string(),
            cookie_domain: String::new(),
            session_valid_days: SESSION_VALID_DAYS,
            remember_me_valid_days: REMEMBER_ME_VALID_DAYS,
            email_token_valid_minutes: EMAIL_TOKEN_VALID_MINUTES,
            forgery_secret,
            google_client_id: None,
            facebook_app_id: None,
            mail_enabled: false,
            mail_from: "noreply@localhost".to_string(),
            mail_from_name: None,
            smtp_host: "localhost".to_string(),
            smtp_port: 25,
            subject_email_login: "Your sign-in link".to_string(),
            subject_email_registration: "Complete your registration".to_string(),
            text_email_login: "Sign in using this link: %URL%".to_string(),
            text_email_registration: "Welcome! Finish signing up using this link: %URL%"
                .to_string(),
        })
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let app_root_url =
            std::env::var("APP_ROOT_URL").map_err(|_| ConfigError::Missing("APP_ROOT_URL"))?;
        let forgery_secret =
            std::env::var("FORGERY_SECRET").map_err(|_| ConfigError::Missing("FORGERY_SECRET"))?;

        let mut config = Self::try_new(app_root_url, forgery_secret)?;

        config.google_client_id = std::env::var("GOOGLE_CLIENT_ID").ok();
        config.facebook_app_id = std::env::var("FACEBOOK_APP_ID").ok();

        if let Ok(enabled) = std::env::var("MAIL_ENABLED") {
            config.mail_enabled = enabled
                .parse()
                .map_err(|_| ConfigError::Invalid("MAIL_ENABLED"))?;
        }
        if let Ok(from) = std::env::var("MAIL_FROM") {
            config.mail_from = from;
        }
        config.mail_from_name = std::env::var("MAIL_FROM_NAME").ok();
        if let Ok(host) = std::env::var("SMTP_HOST") {
            config.smtp_host = host;
        }
        if let Ok(port) = std::env::var("SMTP_PORT") {
            config.smtp_port = port.parse().map_err(|_| ConfigError::Invalid("SMTP_PORT"))?;
        }

        Ok(config)
    }

    /// Override the session validity window
    pub fn with_session_valid_days(mut self, days: i64) -> Self {
        self.session_valid_days = days;
        self
    }

    /// Override the remember-me validity window
    pub fn with_remember_me_valid_days(mut self, days: i64) -> Self {
        self.remember_me_valid_days = days;
        self
    }

    /// Set the Google client id, enabling Google social login
    pub fn with_google_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.google_client_id = Some(client_id.into());
        self
    }

    /// Set the Facebook app id, enabling Facebook social login
    pub fn with_facebook_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.facebook_app_id = Some(app_id.into());
        self
    }

    /// Enable or disable outbound mail delivery
    pub fn with_mail_enabled(mut self, enabled: bool) -> Self {
        self.mail_enabled = enabled;
        self
    }

    /// Sliding window applied to session tokens
    pub fn session_window(&self) -> ValidityWindow {
        ValidityWindow::days(self.session_valid_days)
    }

    /// Sliding window applied to remember-me tokens
    pub fn remember_me_window(&self) -> ValidityWindow {
        ValidityWindow::days(self.remember_me_valid_days)
    }

    /// Attributes for the persistent remember-me cookie
    pub fn remember_me_cookie_attributes(&self) -> CookieAttributes {
        CookieAttributes::remember_me(&self.cookie_path, &self.cookie_domain)
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid configuration value: {0}")]
    Invalid(&'static str),
}
