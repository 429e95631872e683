//! Error types for StyleLayer storage.

use stylelayer_core::CoreError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be parsed back into its domain type.
    #[error("corrupt row: {0}")]
    Corrupt(#[from] CoreError),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The entity kind that was looked up.
        entity: &'static str,
        /// The id that missed.
        id: String,
    },

    /// Insufficient credits for a deduction.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },
}

impl StoreError {
    /// Shorthand for `NotFound`.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}
