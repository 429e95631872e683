//! Error types for StyleLayer core.

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur when constructing or parsing core types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// An identity subject was empty.
    #[error("identity subject must not be empty")]
    EmptyIdentity,

    /// The input is not a valid generation id.
    #[error("invalid generation id")]
    InvalidGenerationId,

    /// An enum column held a value we do not recognise.
    #[error("unknown {kind} value: {value}")]
    UnknownVariant {
        /// Which enum was being parsed.
        kind: &'static str,
        /// The offending value.
        value: String,
    },
}

impl CoreError {
    /// Shorthand for `UnknownVariant`.
    #[must_use]
    pub fn unknown(kind: &'static str, value: &str) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.to_string(),
        }
    }
}
