//! Shared test fixtures

pub mod mock_repos;

use std::sync::Arc;

use gatehouse_auth_core::{
    AuthConfig, CookieAttributes, IdentityManager, SessionContext,
};
use mock_repos::{
    MockEmailTokenRepository, MockGroupRepository, MockSessionTokenRepository, MockUserRepository,
};

/// Identity manager wired to in-memory repositories
pub type TestIdentityManager = IdentityManager<
    MockUserRepository,
    MockEmailTokenRepository,
    MockSessionTokenRepository,
    MockGroupRepository,
>;

/// All mock repositories, kept so tests can inspect and seed them directly
#[derive(Clone)]
pub struct TestRepos {
    pub users: Arc<MockUserRepository>,
    pub email_tokens: Arc<MockEmailTokenRepository>,
    pub session_tokens: Arc<MockSessionTokenRepository>,
    pub groups: Arc<MockGroupRepository>,
}

impl TestRepos {
    pub fn new() -> Self {
        Self {
            users: Arc::new(MockUserRepository::new()),
            email_tokens: Arc::new(MockEmailTokenRepository::new()),
            session_tokens: Arc::new(MockSessionTokenRepository::new()),
            groups: Arc::new(MockGroupRepository::new()),
        }
    }
}

/// Config with test defaults
pub fn test_config() -> AuthConfig {
    AuthConfig::try_new("https://app.example.com", "test-secret-test-secret-test-secret!")
        .expect("test config is valid")
}

/// Build an identity manager over the given repositories
#[allow(dead_code)]
pub fn identity_manager(repos: &TestRepos) -> TestIdentityManager {
    identity_manager_with(repos, test_config())
}

/// Build an identity manager with a custom config
pub fn identity_manager_with(repos: &TestRepos, config: AuthConfig) -> TestIdentityManager {
    IdentityManager::new(
        config,
        Arc::clone(&repos.users),
        Arc::clone(&repos.email_tokens),
        Arc::clone(&repos.session_tokens),
        Arc::clone(&repos.groups),
    )
}

/// Mail transport that records instead of delivering
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: std::sync::Mutex<Vec<SentMail>>,
}

/// One recorded outbound message
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait::async_trait]
impl gatehouse_auth_core::MailTransport for RecordingTransport {
    async fn send(
        &self,
        to: &gatehouse_types::Email,
        subject: &str,
        text_body: &str,
    ) -> Result<(), gatehouse_auth_core::AuthError> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: text_body.to_string(),
        });
        Ok(())
    }
}

/// In-memory session context standing in for the caller's session and
/// cookie machinery.
#[derive(Debug, Clone, Default)]
pub struct MockSessionContext {
    pub session_token: Option<String>,
    pub remember_me: Option<String>,
    pub secure_transport: bool,
    #[allow(dead_code)]
    pub last_cookie_attributes: Option<CookieAttributes>,
}

impl MockSessionContext {
    /// Context for a request over a confirmed-secure transport
    pub fn secure() -> Self {
        Self {
            secure_transport: true,
            ..Self::default()
        }
    }

    /// Context for a request over an unconfirmed transport
    #[allow(dead_code)]
    pub fn insecure() -> Self {
        Self::default()
    }

    /// A follow-up request carrying only the remember-me cookie
    #[allow(dead_code)]
    pub fn secure_with_cookie(cookie: impl Into<String>) -> Self {
        Self {
            remember_me: Some(cookie.into()),
            secure_transport: true,
            ..Self::default()
        }
    }
}

impl SessionContext for MockSessionContext {
    fn session_token(&self) -> Option<String> {
        self.session_token.clone()
    }

    fn set_session_token(&mut self, token: &str) {
        self.session_token = Some(token.to_string());
    }

    fn clear_session_token(&mut self) {
        self.session_token = None;
    }

    fn remember_me_cookie(&self) -> Option<String> {
        self.remember_me.clone()
    }

    fn set_remember_me_cookie(&mut self, token: &str, attributes: &CookieAttributes) {
        self.remember_me = Some(token.to_string());
        self.last_cookie_attributes = Some(attributes.clone());
    }

    fn clear_remember_me_cookie(&mut self, attributes: &CookieAttributes) {
        self.remember_me = None;
        self.last_cookie_attributes = Some(attributes.clone());
    }

    fn is_secure_transport(&self) -> bool {
        self.secure_transport
    }
}
