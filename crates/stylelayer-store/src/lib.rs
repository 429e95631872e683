//! SQLite storage layer for StyleLayer.
//!
//! All durable state lives here: users, sessions, the append-only credit
//! ledger, generation tasks and subscriptions. Every money-moving operation
//! runs inside a single SQLite transaction so a crash can never leave a
//! user charged without a task row or refunded twice.
//!
//! # Tables
//!
//! - `users`: one row per OAuth identity, holds plan and mutable balance
//! - `sessions`: opaque token -> identity binding with absolute expiry
//! - `credit_logs`: insert-only ledger; per-user sum reconciles the balance
//! - `generations`: one row per generation request with terminal status
//! - `subscriptions`: mirrored billing agreements keyed by the external id
//!
//! # Example
//!
//! ```no_run
//! use stylelayer_store::SqliteStore;
//!
//! # async fn demo() -> Result<(), stylelayer_store::StoreError> {
//! let store = SqliteStore::connect("sqlite://stylelayer.db?mode=rwc").await?;
//! let user = store.get_or_create_user(&"108234".parse().unwrap(), "a@b.c").await?;
//! assert_eq!(user.credits_balance, 3);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod schema;
pub mod sqlite;

pub use error::{Result, StoreError};
pub use sqlite::{ActivationOutcome, NewGeneration, SqliteStore};
