//! User and plan types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::IdentityId;

// ============================================================================
// Constants
// ============================================================================

/// Credits granted once on first sign-in.
pub const ONBOARDING_BONUS_CREDITS: i64 = 3;

/// Credits charged per generation request.
pub const CREDITS_PER_GENERATION: i64 = 1;

/// Influencer plan monthly credit allowance.
pub const INFLUENCER_MONTHLY_CREDITS: i64 = 60;

/// Studio Pro plan monthly credit allowance.
pub const STUDIO_PRO_MONTHLY_CREDITS: i64 = 200;

/// A provisioned user account.
///
/// Created on first successful OAuth sign-in; mutated by credit operations
/// and subscription status changes; never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// External OAuth subject, unique per user.
    pub identity_id: IdentityId,

    /// Email captured at sign-in.
    pub email: String,

    /// Current plan tier.
    pub plan: Plan,

    /// Current credit balance. Invariant: never observably negative.
    pub credits_balance: i64,

    /// When the user was created.
    pub created_at: DateTime<Utc>,

    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The session-visible view of a user: identity plus the display fields
/// snapshotted when the session was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// External OAuth subject.
    pub identity_id: IdentityId,
    /// Email at session-creation time.
    pub email: String,
    /// Display name at session-creation time.
    pub name: String,
    /// Avatar URL, if the provider supplied one.
    pub picture: Option<String>,
}

/// Available plan tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Plan {
    /// Free tier: onboarding credits only.
    Free,

    /// Influencer plan: 60 credits/month.
    Influencer,

    /// Studio Pro plan: 200 credits/month.
    StudioPro,
}

impl Plan {
    /// Monthly credit allowance for this plan.
    #[must_use]
    pub const fn monthly_credits(&self) -> i64 {
        match self {
            Self::Free => 0,
            Self::Influencer => INFLUENCER_MONTHLY_CREDITS,
            Self::StudioPro => STUDIO_PRO_MONTHLY_CREDITS,
        }
    }

    /// The canonical database / wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Influencer => "INFLUENCER",
            Self::StudioPro => "STUDIO_PRO",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FREE" => Ok(Self::Free),
            "INFLUENCER" => Ok(Self::Influencer),
            "STUDIO_PRO" => Ok(Self::StudioPro),
            other => Err(CoreError::unknown("plan", other)),
        }
    }
}
