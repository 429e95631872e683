//! Common test utilities for stylelayer integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use chrono::{Duration, Utc};

use stylelayer_core::{IdentityId, SessionUser};
use stylelayer_service::crypto::generate_session_token;
use stylelayer_service::{create_router, AppState, ServiceConfig};
use stylelayer_store::SqliteStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct store handle for seeding and asserting on state.
    pub store: Arc<SqliteStore>,
}

impl TestHarness {
    /// Create a harness with the default test configuration.
    pub async fn new() -> Self {
        Self::with_config(Self::test_config()).await
    }

    /// Create a harness around a caller-supplied configuration (used when
    /// tests point external clients at wiremock servers).
    pub async fn with_config(config: ServiceConfig) -> Self {
        let store = Arc::new(
            SqliteStore::in_memory()
                .await
                .expect("Failed to open in-memory store"),
        );

        let state = AppState::new(Arc::clone(&store), config);
        let router: Router = create_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, store }
    }

    /// Baseline configuration for tests: short poll cycles, fixed secret,
    /// no external integrations unless a test adds them.
    pub fn test_config() -> ServiceConfig {
        ServiceConfig {
            session_secret: "test-secret".into(),
            vision_poll_interval_ms: 10,
            vision_poll_attempts: 3,
            ..ServiceConfig::default()
        }
    }

    /// Provision a user and mint a session for them; returns the Cookie
    /// header value to authenticate requests with.
    pub async fn sign_in(&self, identity: &str) -> String {
        self.store
            .get_or_create_user(&id(identity), &format!("{identity}@example.com"))
            .await
            .expect("Failed to provision user");

        self.create_session(identity).await
    }

    /// Mint a session without provisioning the user row.
    pub async fn create_session(&self, identity: &str) -> String {
        let token = generate_session_token();
        let user = SessionUser {
            identity_id: id(identity),
            email: format!("{identity}@example.com"),
            name: identity.to_string(),
            picture: None,
        };

        self.store
            .create_session(&token, &user, Utc::now() + Duration::days(7))
            .await
            .expect("Failed to create session");

        format!("stylelayer_session={token}")
    }

    /// Current balance straight from the store.
    pub async fn balance(&self, identity: &str) -> i64 {
        self.store.get_balance(&id(identity)).await.unwrap()
    }
}

/// Parse a test identity id.
pub fn id(s: &str) -> IdentityId {
    s.parse().unwrap()
}
