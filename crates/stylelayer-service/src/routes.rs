//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, credits, generate, health, subscriptions, webhooks};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent generation requests.
/// Each request holds a connection for the whole poll window, so this is
/// kept well below the general API limit.
const GENERATE_MAX_CONCURRENT_REQUESTS: usize = 8;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /auth/complete` - Handoff completion (sets the session cookie)
///
/// ## Auth
/// - `GET  /api/auth/google` - Redirect to Google consent screen
/// - `GET  /api/auth/callback` - OAuth code exchange
/// - `GET  /api/auth/session` - Current session user
/// - `POST /api/auth/signout` - Revoke session
///
/// ## User (session auth)
/// - `GET  /api/user/credits` - Current balance
/// - `GET  /api/user/history` - Recent ledger entries
/// - `POST /api/generate` - Run a generation (concurrency-limited)
///
/// ## Billing
/// - `POST /api/paypal/create-subscription` - Start checkout (session auth)
/// - `GET  /api/paypal/subscription-callback` - Approval return redirect
/// - `POST /api/paypal/webhook` - PayPal lifecycle events
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Generation holds its worker for the whole poll window, so it gets
    // its own, tighter concurrency limit.
    let generate_routes = Router::new()
        .route("/", post(generate::generate))
        .layer(ConcurrencyLimitLayer::new(GENERATE_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        // Auth
        .route("/auth/google", get(auth::google_signin))
        .route("/auth/callback", get(auth::google_callback))
        .route("/auth/session", get(auth::get_session))
        .route("/auth/signout", post(auth::signout))
        // User
        .route("/user/credits", get(credits::get_credits))
        .route("/user/history", get(credits::get_history))
        // Billing
        .route(
            "/paypal/create-subscription",
            post(subscriptions::create_subscription),
        )
        .route(
            "/paypal/subscription-callback",
            get(subscriptions::subscription_callback),
        )
        // Generation (with its own concurrency limit)
        .nest("/generate", generate_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS))
        // Webhooks are paced by PayPal, not browsers - no concurrency cap
        .route("/paypal/webhook", post(webhooks::paypal_webhook));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // Cookie handoff completion (public, browser navigation)
        .route("/auth/complete", get(auth::auth_complete))
        // API routes
        .nest("/api", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
