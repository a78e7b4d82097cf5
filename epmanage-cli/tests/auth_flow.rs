//! Integration tests for the login / second factor exchange and the
//! privilege gate.

use std::sync::Arc;

use chrono::Utc;
use epmanage_cli::auth::{
    AuthError, AuthPhase, Authenticator, Credentials, TokenValidation, require_privilege,
};
use epmanage_cli::session::Session;
use epmanage_shared::privilege::Privilege;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mint(aud: &[&str]) -> String {
    let now = Utc::now().timestamp();
    encode(
        &Header::new(Algorithm::HS256),
        &json!({"sub": "user-1", "iat": now - 5, "nbf": now - 5, "exp": now + 600, "aud": aud}),
        &EncodingKey::from_secret(b"integration"),
    )
    .expect("failed to mint token")
}

fn create_authenticator(server: &MockServer) -> (Arc<Session>, Authenticator) {
    let session = Session::new().expect("failed to create session");
    session.set_base_url(server.uri());
    let session = Arc::new(session);
    let auth = Authenticator::new(session.clone(), TokenValidation::default());
    (session, auth)
}

#[tokio::test]
async fn test_login_without_second_factor() {
    let server = MockServer::start().await;
    let token = mint(&["urn:cmi_ro", "urn:cmi_rw"]);
    Mock::given(method("POST"))
        .and(path("/frontend/login"))
        .and(body_json(json!({"email": "a@example.com", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(token.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let (_session, mut auth) = create_authenticator(&server);
    assert_eq!(auth.phase(), AuthPhase::Anonymous);

    let returned = auth.login("a@example.com", "pw").await.expect("login failed");
    assert_eq!(returned, token);
    assert_eq!(auth.phase(), AuthPhase::Authenticated);
    assert_eq!(auth.token(), Some(token.as_str()));
}

#[tokio::test]
async fn test_login_rejected_keeps_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/frontend/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "_status": "ERR", "_error": {"code": 401, "message": "Invalid credentials"}
        })))
        .mount(&server)
        .await;

    let (_session, mut auth) = create_authenticator(&server);
    let err = auth.login("a@example.com", "bad").await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::Rejected { status, .. } if status == StatusCode::UNAUTHORIZED
    ));
    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(auth.phase(), AuthPhase::Anonymous);
    assert_eq!(auth.token(), None);
}

#[tokio::test]
async fn test_login_rejection_without_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/frontend/login"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let (_session, mut auth) = create_authenticator(&server);
    let err = auth.login("a@example.com", "pw").await.unwrap_err();
    assert_eq!(err.to_string(), "Unknown error");
}

#[tokio::test]
async fn test_undecodable_token_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/frontend/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("definitely-not-a-jwt"))
        .mount(&server)
        .await;

    let (_session, mut auth) = create_authenticator(&server);
    let err = auth.login("a@example.com", "pw").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));
    assert_eq!(auth.phase(), AuthPhase::Anonymous);
}

#[tokio::test]
async fn test_mfa_pending_until_completed() {
    let server = MockServer::start().await;
    let pre_mfa = mint(&["urn:cmi_mfa"]);
    let full = mint(&["urn:cmi_ro", "urn:cmi_admin"]);

    Mock::given(method("POST"))
        .and(path("/frontend/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(pre_mfa.clone()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/frontend/login-mfa"))
        .and(header("authorization", format!("Bearer {}", pre_mfa).as_str()))
        .and(body_json(json!({"code": "000000"})))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "_status": "ERR", "_error": {"code": 403, "message": "Invalid MFA code"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/frontend/login-mfa"))
        .and(header("authorization", format!("Bearer {}", pre_mfa).as_str()))
        .and(body_json(json!({"code": "123456"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(full.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let (session, mut auth) = create_authenticator(&server);
    auth.login("a@example.com", "pw").await.expect("login failed");
    assert_eq!(auth.phase(), AuthPhase::MfaPending);
    assert_eq!(auth.token(), Some(pre_mfa.as_str()));

    let err = auth.complete_mfa("000000").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid MFA code");
    assert_eq!(auth.phase(), AuthPhase::MfaPending);

    let token = auth.complete_mfa("123456").await.expect("mfa failed");
    assert_eq!(token, full);
    assert_eq!(auth.phase(), AuthPhase::Authenticated);
    assert_eq!(auth.token(), Some(full.as_str()));
    // logging in never arms the shared session
    assert_eq!(session.token(), None);
}

#[tokio::test]
async fn test_complete_mfa_without_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (_session, mut auth) = create_authenticator(&server);
    let err = auth.complete_mfa("123456").await.unwrap_err();
    assert!(matches!(err, AuthError::NoPreviousToken));
    assert_eq!(err.to_string(), "No previous token");
}

#[tokio::test]
async fn test_gate_then_request_carries_token() {
    let server = MockServer::start().await;
    let token = mint(&["urn:cmi_ro"]);
    Mock::given(method("GET"))
        .and(path("/frontend/packages"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::new().unwrap();
    session.set_base_url(server.uri());
    let session = Arc::new(session);
    let credentials = Credentials::new(token.clone(), TokenValidation::default());

    let err = require_privilege(Some(&credentials), Privilege::ReadWrite, &session).unwrap_err();
    assert!(matches!(err, AuthError::InsufficientPermissions(Privilege::ReadWrite)));
    assert_eq!(session.token(), None);

    let claims = require_privilege(Some(&credentials), Privilege::ReadOnly, &session).unwrap();
    assert_eq!(claims.subject(), Some("user-1"));

    let packages = epmanage_cli::api::package::PackageClient::new(session)
        .list()
        .await
        .expect("list failed");
    assert!(packages.is_empty());
}
