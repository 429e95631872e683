//! Subscription types.
//!
//! A subscription row mirrors an external recurring-billing agreement.
//! It is created `Pending` when checkout is initiated and reconciled by
//! the return-redirect and asynchronous webhooks, which may arrive in any
//! order or more than once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::{IdentityId, Plan};

/// A locally mirrored billing subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Row id (assigned by the store).
    pub id: i64,

    /// The subscribing user.
    pub identity_id: IdentityId,

    /// The external (PayPal) subscription id.
    pub paypal_subscription_id: String,

    /// The plan this subscription pays for.
    pub plan: Plan,

    /// Monthly or annual billing.
    pub billing_cycle: BillingCycle,

    /// Current lifecycle state.
    pub status: SubscriptionStatus,

    /// Credits granted per billing month.
    pub credits_per_month: i64,

    /// Start of the current billing period, once active.
    pub current_period_start: Option<DateTime<Utc>>,

    /// End of the current billing period, once active.
    pub current_period_end: Option<DateTime<Utc>>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Subscription lifecycle states.
///
/// `Pending -> Active -> {Cancelled, Expired, Suspended}`; the last three
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// Checkout initiated, payment not yet approved.
    Pending,

    /// Payment approved; plan and credits are in effect.
    Active,

    /// Cancelled by the user or the billing system. Terminal.
    Cancelled,

    /// Lapsed at the billing system. Terminal.
    Expired,

    /// Suspended by the billing system. Terminal.
    Suspended,
}

impl SubscriptionStatus {
    /// Whether this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Expired | Self::Suspended)
    }

    /// The canonical database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
            Self::Suspended => "SUSPENDED",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ACTIVE" => Ok(Self::Active),
            "CANCELLED" => Ok(Self::Cancelled),
            "EXPIRED" => Ok(Self::Expired),
            "SUSPENDED" => Ok(Self::Suspended),
            other => Err(CoreError::unknown("subscription_status", other)),
        }
    }
}

/// Billing cycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    /// Billed every month.
    Monthly,
    /// Billed yearly; credits still granted monthly.
    Annual,
}

impl BillingCycle {
    /// The canonical database / wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "annual" => Ok(Self::Annual),
            other => Err(CoreError::unknown("billing_cycle", other)),
        }
    }
}
