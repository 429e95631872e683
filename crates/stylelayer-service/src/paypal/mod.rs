//! PayPal billing integration.
//!
//! PayPal handles:
//! - Subscription checkout (approval links)
//! - Recurring billing
//! - Lifecycle webhooks (activated, cancelled, expired, suspended)

pub mod client;
pub mod types;

pub use client::{PayPalClient, PayPalError, PendingCheckout};
pub use types::SubscriptionDetails;
