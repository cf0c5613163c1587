//! End-to-end tests of the login-page flow

mod common;

use std::sync::Arc;

use common::{
    identity_manager_with, test_config, MockSessionContext, RecordingTransport, TestRepos,
};
use gatehouse_auth_core::{
    AuthError, FlowOutcome, FlowRequest, HttpMethod, LoginFlow, SocialLoginOutcome,
};

type TestFlow = LoginFlow<
    common::mock_repos::MockUserRepository,
    common::mock_repos::MockEmailTokenRepository,
    common::mock_repos::MockSessionTokenRepository,
    common::mock_repos::MockGroupRepository,
>;

fn flow(repos: &TestRepos, transport: Arc<RecordingTransport>) -> TestFlow {
    let config = test_config().with_mail_enabled(true);
    LoginFlow::new(identity_manager_with(repos, config), transport).unwrap()
}

fn page(outcome: &FlowOutcome) -> (bool, bool, &str) {
    match outcome {
        FlowOutcome::Page {
            show_login,
            show_logout,
            message,
        } => (*show_login, *show_logout, message.as_str()),
        FlowOutcome::Redirect { .. } => panic!("expected a page, got a redirect"),
    }
}

#[tokio::test]
async fn test_first_visit_shows_login_form() {
    let repos = TestRepos::new();
    let mut flow = flow(&repos, Arc::new(RecordingTransport::default()));
    let mut ctx = MockSessionContext::secure();

    let outcome = flow
        .handle(HttpMethod::Get, FlowRequest::default(), &mut ctx)
        .await
        .unwrap();

    let (show_login, show_logout, _) = page(&outcome);
    assert!(show_login);
    assert!(!show_logout);
}

#[tokio::test]
async fn test_posted_email_sends_login_link() {
    let repos = TestRepos::new();
    let transport = Arc::new(RecordingTransport::default());
    let mut flow = flow(&repos, transport.clone());
    let mut ctx = MockSessionContext::secure();

    let forgery_token = flow.issue_forgery_token();
    let outcome = flow
        .handle(
            HttpMethod::Post,
            FlowRequest::with_login_form("user@example.com", forgery_token),
            &mut ctx,
        )
        .await
        .unwrap();

    let (show_login, show_logout, message) = page(&outcome);
    assert!(!show_login);
    assert!(!show_logout);
    assert!(message.contains("on its way"));

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "user@example.com");
    // New user gets the registration wording
    assert_eq!(sent[0].subject, "Complete your registration");
    assert!(sent[0].body.contains("https://app.example.com/user/?token="));
}

#[tokio::test]
async fn test_emailed_token_completes_login() {
    let repos = TestRepos::new();
    let transport = Arc::new(RecordingTransport::default());
    let mut flow = flow(&repos, transport.clone());
    let mut ctx = MockSessionContext::secure();

    let forgery_token = flow.issue_forgery_token();
    flow.handle(
        HttpMethod::Post,
        FlowRequest::with_login_form("user@example.com", forgery_token),
        &mut ctx,
    )
    .await
    .unwrap();

    // Pull the token out of the recorded email, as the recipient would
    let body = transport.sent.lock().unwrap()[0].body.clone();
    let token = body.split("token=").nth(1).unwrap().trim().to_string();

    let outcome = flow
        .handle(HttpMethod::Get, FlowRequest::with_token(token), &mut ctx)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        FlowOutcome::Redirect {
            url: "https://app.example.com/user".to_string()
        }
    );

    // The next visit is recognized as signed in
    let outcome = flow
        .handle(HttpMethod::Get, FlowRequest::default(), &mut ctx)
        .await
        .unwrap();
    let (show_login, show_logout, message) = page(&outcome);
    assert!(!show_login);
    assert!(show_logout);
    assert!(message.contains("user@example.com"));
}

#[tokio::test]
async fn test_invalid_token_shows_login_form() {
    let repos = TestRepos::new();
    let mut flow = flow(&repos, Arc::new(RecordingTransport::default()));
    let mut ctx = MockSessionContext::secure();

    let outcome = flow
        .handle(
            HttpMethod::Get,
            FlowRequest::with_token("bogus-token"),
            &mut ctx,
        )
        .await
        .unwrap();

    let (show_login, _, message) = page(&outcome);
    assert!(show_login);
    assert_eq!(message, "Invalid token.");
}

#[tokio::test]
async fn test_invalid_email_reprompts() {
    let repos = TestRepos::new();
    let mut flow = flow(&repos, Arc::new(RecordingTransport::default()));
    let mut ctx = MockSessionContext::secure();

    let forgery_token = flow.issue_forgery_token();
    let outcome = flow
        .handle(
            HttpMethod::Post,
            FlowRequest::with_login_form("not-an-email", forgery_token),
            &mut ctx,
        )
        .await
        .unwrap();

    let (show_login, _, message) = page(&outcome);
    assert!(show_login);
    assert_eq!(message, "Invalid email format.");
    assert_eq!(repos.users.user_count(), 0);
}

#[tokio::test]
async fn test_forged_token_reprompts() {
    let repos = TestRepos::new();
    let mut flow = flow(&repos, Arc::new(RecordingTransport::default()));
    let mut ctx = MockSessionContext::secure();

    let outcome = flow
        .handle(
            HttpMethod::Post,
            FlowRequest::with_login_form("user@example.com", "forged.token"),
            &mut ctx,
        )
        .await
        .unwrap();

    let (show_login, _, message) = page(&outcome);
    assert!(show_login);
    assert_eq!(message, "Token mismatch.");
    assert_eq!(repos.email_tokens.token_count(), 0);
}

#[tokio::test]
async fn test_post_without_form_fields_is_a_validation_error() {
    let repos = TestRepos::new();
    let mut flow = flow(&repos, Arc::new(RecordingTransport::default()));
    let mut ctx = MockSessionContext::secure();

    let result = flow
        .handle(HttpMethod::Post, FlowRequest::default(), &mut ctx)
        .await;
    assert!(matches!(result, Err(AuthError::Validation(_))));
}

#[tokio::test]
async fn test_logout_flag_redirects_and_ends_session() {
    let repos = TestRepos::new();
    let transport = Arc::new(RecordingTransport::default());
    let mut flow = flow(&repos, transport.clone());
    let mut ctx = MockSessionContext::secure();

    let forgery_token = flow.issue_forgery_token();
    flow.handle(
        HttpMethod::Post,
        FlowRequest::with_login_form("user@example.com", forgery_token),
        &mut ctx,
    )
    .await
    .unwrap();
    let body = transport.sent.lock().unwrap()[0].body.clone();
    let token = body.split("token=").nth(1).unwrap().trim().to_string();
    flow.handle(HttpMethod::Get, FlowRequest::with_token(token), &mut ctx)
        .await
        .unwrap();

    let outcome = flow
        .handle(
            HttpMethod::Get,
            FlowRequest {
                logout: true,
                ..FlowRequest::default()
            },
            &mut ctx,
        )
        .await
        .unwrap();

    assert!(matches!(outcome, FlowOutcome::Redirect { .. }));
    assert!(ctx.session_token.is_none());
    assert!(ctx.remember_me.is_none());
}

#[tokio::test]
async fn test_remember_me_cookie_auto_relogs_in() {
    let repos = TestRepos::new();
    let transport = Arc::new(RecordingTransport::default());
    let mut flow = flow(&repos, transport.clone());
    let mut ctx = MockSessionContext::secure();

    let forgery_token = flow.issue_forgery_token();
    flow.handle(
        HttpMethod::Post,
        FlowRequest::with_login_form("user@example.com", forgery_token),
        &mut ctx,
    )
    .await
    .unwrap();
    let body = transport.sent.lock().unwrap()[0].body.clone();
    let token = body.split("token=").nth(1).unwrap().trim().to_string();
    flow.handle(HttpMethod::Get, FlowRequest::with_token(token), &mut ctx)
        .await
        .unwrap();
    let cookie = ctx.remember_me.clone().unwrap();

    // A later request with only the cookie
    let mut revisit = MockSessionContext::secure_with_cookie(cookie);
    let outcome = flow
        .handle(HttpMethod::Get, FlowRequest::default(), &mut revisit)
        .await
        .unwrap();

    assert!(matches!(outcome, FlowOutcome::Redirect { .. }));
    assert!(revisit.session_token.is_some());
}

// ============================================================================
// Social login
// ============================================================================

#[tokio::test]
async fn test_social_login_with_unknown_provider() {
    let repos = TestRepos::new();
    let mut flow = flow(&repos, Arc::new(RecordingTransport::default()));
    let mut ctx = MockSessionContext::secure();

    let outcome = flow
        .social_login("myspace", "some-token", &mut ctx)
        .await
        .unwrap();
    assert_eq!(outcome, SocialLoginOutcome::UnsupportedProvider);
}

#[tokio::test]
async fn test_social_login_with_empty_token() {
    let repos = TestRepos::new();
    let mut flow = flow(&repos, Arc::new(RecordingTransport::default()));
    let mut ctx = MockSessionContext::secure();

    let outcome = flow.social_login("google", "", &mut ctx).await.unwrap();
    assert_eq!(outcome, SocialLoginOutcome::MissingCredentials);
}
