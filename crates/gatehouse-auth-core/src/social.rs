//! Social identity resolvers
//!
//! Each resolver exchanges a provider bearer token for a verified email
//! claim by calling the provider's own verification endpoint. Verification
//! failures of any kind resolve to "absent"; the core never sees a
//! partially-trusted payload.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;

/// Google's issuer value for id tokens
const GOOGLE_ISSUER: &str = "https://accounts.google.com";
/// Google's id-token verification endpoint
const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
/// Facebook Graph profile endpoint
const FACEBOOK_ME_URL: &str = "https://graph.facebook.com/me";

/// A verified email claim returned by a resolver
#[derive(Debug, Clone)]
pub struct EmailClaim {
    /// The verified email address, as the provider reported it
    pub email: String,
    /// Provider-scoped subject identifier, when the provider returns one
    pub subject: Option<String>,
    /// Display name, when the provider returns one
    pub display_name: Option<String>,
}

/// Capability contract for provider-specific bearer-token verification.
///
/// `None` means the token could not be verified: wrong audience, wrong
/// issuer, expired, transport failure, or missing email all look the same
/// to the caller.
#[async_trait]
pub trait SocialIdentityResolver: Send + Sync {
    /// Exchange a provider bearer token for a verified email claim
    async fn auth_token_to_email(&self, auth_token: &str) -> Option<EmailClaim>;
}

/// Select a resolver by the request's provider discriminator.
///
/// Returns `None` for an unknown provider string. A known provider without
/// configured credentials still resolves every token to absent.
pub fn resolver_for(
    provider: &str,
    config: &AuthConfig,
) -> Option<Box<dyn SocialIdentityResolver>> {
    let client = verification_client();
    match provider {
        "google" => Some(Box::new(GoogleResolver::new(
            config.google_client_id.clone(),
            client,
        ))),
        "facebook" => Some(Box::new(FacebookResolver::new(
            config.facebook_app_id.clone(),
            client,
        ))),
        _ => None,
    }
}

/// HTTP client tuned for the verification endpoints: aggressive timeouts to
/// fail fast, small idle pool since each provider is a single host.
pub fn verification_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(2)
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

// =============================================================================
// Google
// =============================================================================

/// Response of Google's tokeninfo endpoint (numeric fields arrive as strings)
#[derive(Debug, Clone, Deserialize)]
struct GoogleTokenInfo {
    aud: String,
    iss: String,
    exp: String,
    sub: Option<String>,
    email: Option<String>,
    name: Option<String>,
}

/// Resolver for Google id tokens.
///
/// Calls the tokeninfo endpoint directly instead of pulling in a full
/// Google API client, then validates audience, issuer, and expiry itself.
pub struct GoogleResolver {
    client_id: Option<String>,
    http_client: reqwest::Client,
}

impl GoogleResolver {
    /// Create a resolver; `client_id` unset disables it
    pub fn new(client_id: Option<String>, http_client: reqwest::Client) -> Self {
        Self {
            client_id,
            http_client,
        }
    }
}

#[async_trait]
impl SocialIdentityResolver for GoogleResolver {
    async fn auth_token_to_email(&self, auth_token: &str) -> Option<EmailClaim> {
        let Some(client_id) = self.client_id.as_deref() else {
            tracing::debug!("google login not configured");
            return None;
        };

        let response = self
            .http_client
            .get(GOOGLE_TOKENINFO_URL)
            .query(&[("id_token", auth_token)])
            .send()
            .await
            .map_err(|e| tracing::error!("google tokeninfo call failed: {}", e))
            .ok()?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "google rejected the id token");
            return None;
        }

        let info = response
            .json::<GoogleTokenInfo>()
            .await
            .map_err(|e| tracing::error!("unexpected tokeninfo response: {}", e))
            .ok()?;

        validate_google_claims(info, client_id, Utc::now().timestamp())
    }
}

/// Validate the claims Google returned: audience (constant-time), issuer,
/// and expiry must all check out before the email is trusted.
fn validate_google_claims(
    info: GoogleTokenInfo,
    client_id: &str,
    now_ts: i64,
) -> Option<EmailClaim> {
    let audience_ok: bool = info.aud.as_bytes().ct_eq(client_id.as_bytes()).into();
    if !audience_ok {
        tracing::debug!("google token audience does not match configured client id");
        return None;
    }

    if info.iss != GOOGLE_ISSUER {
        tracing::debug!(iss = %info.iss, "google token issuer mismatch");
        return None;
    }

    let expires = info.exp.parse::<i64>().ok()?;
    if expires <= now_ts {
        tracing::debug!("google token expired");
        return None;
    }

    let email = info.email.filter(|e| !e.is_empty())?;
    Some(EmailClaim {
        email,
        subject: info.sub,
        display_name: info.name,
    })
}

// =============================================================================
// Facebook
// =============================================================================

/// Response of the Graph `/me` endpoint
#[derive(Debug, Clone, Deserialize)]
struct FacebookProfile {
    id: String,
    name: Option<String>,
    email: Option<String>,
}

/// Resolver for Facebook access tokens.
///
/// The Graph API only answers `/me` for a live token, so a successful
/// profile fetch is the verification; a profile without an email still
/// resolves to absent.
pub struct FacebookResolver {
    app_id: Option<String>,
    http_client: reqwest::Client,
}

impl FacebookResolver {
    /// Create a resolver; `app_id` unset disables it
    pub fn new(app_id: Option<String>, http_client: reqwest::Client) -> Self {
        Self {
            app_id,
            http_client,
        }
    }
}

#[async_trait]
impl SocialIdentityResolver for FacebookResolver {
    async fn auth_token_to_email(&self, auth_token: &str) -> Option<EmailClaim> {
        if self.app_id.is_none() {
            tracing::debug!("facebook login not configured");
            return None;
        }

        let response = self
            .http_client
            .get(FACEBOOK_ME_URL)
            .query(&[("fields", "id,name,email"), ("access_token", auth_token)])
            .send()
            .await
            .map_err(|e| tracing::error!("facebook graph call failed: {}", e))
            .ok()?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "facebook rejected the access token");
            return None;
        }

        let profile = response
            .json::<FacebookProfile>()
            .await
            .map_err(|e| tracing::error!("unexpected graph response: {}", e))
            .ok()?;

        let email = profile.email.filter(|e| !e.is_empty())?;
        Some(EmailClaim {
            email,
            subject: Some(profile.id),
            display_name: profile.name,
        })
    }
}
