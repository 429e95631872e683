//! StyleLayer HTTP API Service.
//!
//! This crate provides the HTTP API for the StyleLayer backend, including:
//!
//! - Google OAuth sign-in and server-side sessions
//! - Credit balance and transaction history
//! - Generation requests (deduct, submit, poll, resolve)
//! - PayPal subscription checkout and webhooks
//!
//! # Authentication
//!
//! End-user requests carry an opaque session token in the
//! `stylelayer_session` cookie. The token is minted at OAuth callback time
//! and resolved against the session table on every request.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Some handlers need async for consistency

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod google;
pub mod handlers;
pub mod paypal;
pub mod routes;
pub mod state;
pub mod vision;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use google::GoogleOauthClient;
pub use paypal::PayPalClient;
pub use routes::create_router;
pub use state::AppState;
pub use vision::VisionClient;
