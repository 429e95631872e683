//! Authentication flow integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stylelayer_service::ServiceConfig;

async fn harness_with_mock_google(google: &MockServer) -> TestHarness {
    let config = ServiceConfig {
        google_client_id: Some("test-client-id".into()),
        google_client_secret: Some("test-client-secret".into()),
        google_auth_url: format!("{}/auth", google.uri()),
        google_token_url: format!("{}/token", google.uri()),
        google_userinfo_url: format!("{}/userinfo", google.uri()),
        ..TestHarness::test_config()
    };
    TestHarness::with_config(config).await
}

#[tokio::test]
async fn session_endpoint_requires_auth() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/api/auth/session").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn short_session_token_is_rejected() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/api/auth/session")
        .add_header("cookie", "stylelayer_session=short")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_endpoint_returns_current_user() {
    let harness = TestHarness::new().await;
    let cookie = harness.sign_in("g-100").await;

    let response = harness
        .server
        .get("/api/auth/session")
        .add_header("cookie", cookie)
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["user"]["email"], "g-100@example.com");
}

#[tokio::test]
async fn full_oauth_flow_establishes_a_session() {
    let google = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.test",
            "token_type": "Bearer"
        })))
        .mount(&google)
        .await;

    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "g-200",
            "email": "tester@example.com",
            "name": "Tester",
            "picture": "https://lh3.example/photo.jpg"
        })))
        .mount(&google)
        .await;

    let harness = harness_with_mock_google(&google).await;

    // Callback mints a session and bounces through /auth/complete.
    let response = harness.server.get("/api/auth/callback?code=test-code").await;
    response.assert_status(StatusCode::SEE_OTHER);
    let location = response
        .header("location")
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with("/auth/complete?token="));

    // /auth/complete sets the cookie and forwards to the frontend.
    let response = harness.server.get(&location).await;
    response.assert_status(StatusCode::SEE_OTHER);
    let set_cookie = response
        .header("set-cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("stylelayer_session="));
    assert!(set_cookie.contains("HttpOnly"));

    // The cookie authenticates /api/auth/session.
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let response = harness
        .server
        .get("/api/auth/session")
        .add_header("cookie", cookie)
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["user"]["email"], "tester@example.com");

    // Provisioning granted the onboarding bonus exactly once.
    assert_eq!(harness.balance("g-200").await, 3);
}

#[tokio::test]
async fn consent_denial_redirects_to_frontend() {
    let google = MockServer::start().await;
    let harness = harness_with_mock_google(&google).await;

    let response = harness
        .server
        .get("/api/auth/callback?error=access_denied")
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    let location = response.header("location").to_str().unwrap().to_string();
    assert!(location.contains("auth_error=access_denied"));
}

#[tokio::test]
async fn invalid_handoff_token_is_rejected() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/auth/complete?token=not-a-real-token")
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    let location = response.header("location").to_str().unwrap().to_string();
    assert!(location.contains("auth_error=invalid_token"));
    assert!(response.maybe_header("set-cookie").is_none());
}

#[tokio::test]
async fn signout_revokes_the_session() {
    let harness = TestHarness::new().await;
    let cookie = harness.sign_in("g-300").await;

    let response = harness
        .server
        .post("/api/auth/signout")
        .add_header("cookie", cookie.clone())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);

    let response = harness
        .server
        .get("/api/auth/session")
        .add_header("cookie", cookie)
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}
