//! Core types for the StyleLayer platform.
//!
//! This crate provides the foundational types used throughout StyleLayer:
//!
//! - **Identifiers**: `IdentityId`, `GenerationId`
//! - **Users**: `User`, `Plan`, `SessionUser`
//! - **Credits**: `CreditLogEntry`, `ActionType`
//! - **Generations**: `GenerationTask`, `GenerationStatus`
//! - **Subscriptions**: `Subscription`, `SubscriptionStatus`, `BillingCycle`
//!
//! # Credit Unit
//!
//! **1 credit = 1 generation.**
//!
//! - New users get 3 onboarding credits
//! - Each generation request costs 1 credit, refunded on failure
//! - Balances are integers (`i64`), never fractional

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod credits;
pub mod error;
pub mod generation;
pub mod ids;
pub mod subscription;
pub mod user;

pub use credits::{ActionType, CreditLogEntry};
pub use error::{CoreError, Result};
pub use generation::{ExtractType, GenerationStatus, GenerationTask};
pub use ids::{GenerationId, IdentityId};
pub use subscription::{BillingCycle, Subscription, SubscriptionStatus};
pub use user::{
    Plan, SessionUser, User, CREDITS_PER_GENERATION, INFLUENCER_MONTHLY_CREDITS,
    ONBOARDING_BONUS_CREDITS, STUDIO_PRO_MONTHLY_CREDITS,
};
