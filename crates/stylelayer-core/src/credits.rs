//! Credit ledger types.
//!
//! Every balance change appends a `CreditLogEntry`. The log is insert-only:
//! rows are never updated or deleted, so the per-user sum of `amount` is an
//! audit trail that must reconcile with the mutable balance column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::IdentityId;

/// One immutable ledger row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditLogEntry {
    /// Row id (assigned by the store).
    pub id: i64,

    /// The user whose balance changed.
    pub identity_id: IdentityId,

    /// Signed delta. Positive = credit, negative = debit.
    pub amount: i64,

    /// Reason code for the change.
    pub action_type: ActionType,

    /// Human-readable description.
    pub description: String,

    /// When the entry was appended.
    pub created_at: DateTime<Utc>,
}

/// Reason codes for ledger entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// One-time signup bonus.
    Onboarding,

    /// Deduction for a generation request.
    Generation,

    /// Refund for a failed generation.
    Refund,

    /// Subscription activation or recurring payment grant.
    Purchase,
}

impl ActionType {
    /// The canonical database / wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Onboarding => "ONBOARDING",
            Self::Generation => "GENERATION",
            Self::Refund => "REFUND",
            Self::Purchase => "PURCHASE",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONBOARDING" => Ok(Self::Onboarding),
            "GENERATION" => Ok(Self::Generation),
            "REFUND" => Ok(Self::Refund),
            "PURCHASE" => Ok(Self::Purchase),
            other => Err(CoreError::unknown("action_type", other)),
        }
    }
}
