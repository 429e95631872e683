//! HTTP request handlers.

pub mod auth;
pub mod credits;
pub mod generate;
pub mod health;
pub mod subscriptions;
pub mod webhooks;
