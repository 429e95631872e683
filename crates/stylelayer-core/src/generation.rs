//! Generation task types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::{GenerationId, IdentityId};

/// One unit of work against the external image-generation service.
///
/// A task is created in `Pending` status when the user's credits are
/// deducted, and is finalised exactly once to `Completed` or `Failed`.
/// It is never re-opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationTask {
    /// Task id, minted at submission.
    pub id: GenerationId,

    /// The owning user.
    pub identity_id: IdentityId,

    /// Extraction type selected by the user.
    pub kind: String,

    /// Public URL of the uploaded source image.
    pub original_url: String,

    /// Public URL of the generated flat-lay, once completed.
    pub result_url: Option<String>,

    /// Task status; monotonic Pending -> {Completed, Failed}.
    pub status: GenerationStatus,

    /// The full prompt sent to the generation API.
    pub prompt_used: String,

    /// Credits charged when the task was admitted.
    pub credits_spent: i64,

    /// When the task was created.
    pub created_at: DateTime<Utc>,
}

/// Status of a generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStatus {
    /// Credits deducted, external call in flight.
    Pending,

    /// Finished with a result URL. Terminal.
    Completed,

    /// Finished without a result; credits were refunded. Terminal.
    Failed,
}

impl GenerationStatus {
    /// Whether this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// The canonical database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            other => Err(CoreError::unknown("generation_status", other)),
        }
    }
}

/// Preset extraction types a user can pick on submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractType {
    /// Deconstruct a full outfit into a flat-lay.
    FullBody,
    /// Extract a pair of shoes.
    Shoes,
    /// Extract a bag with its strap.
    Bag,
    /// Extract a sofa.
    Sofa,
    /// Extract daily-use objects.
    Daily,
    /// Extract accessories.
    Accessory,
    /// Free-text target supplied by the user.
    Custom,
}

impl ExtractType {
    /// The database representation of the kind column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FullBody => "FULL_BODY",
            Self::Shoes => "SHOES",
            Self::Bag => "BAG",
            Self::Sofa => "SOFA",
            Self::Daily => "DAILY",
            Self::Accessory => "ACCESSORY",
            Self::Custom => "CUSTOM",
        }
    }

    /// The preset extraction prompt, or `None` for `Custom` (the caller
    /// supplies the target text).
    #[must_use]
    pub const fn preset_prompt(&self) -> Option<&'static str> {
        match self {
            Self::FullBody => Some(
                "Deconstruct the clothing, hat, shoes and bag (if present) of the main \
                 person in the image into a knolling flat-lay on a clean white background.",
            ),
            Self::Shoes => Some(
                "Extract the pair of shoes from the image as a 45-degree product shot \
                 on a clean white background.",
            ),
            Self::Bag => Some(
                "Extract the complete bag with its strap from the image, front view, \
                 on a clean white background.",
            ),
            Self::Sofa => Some(
                "Extract the complete sofa from the image, front view, on a clean \
                 white background.",
            ),
            Self::Daily => Some(
                "Extract the daily-use items from the image, front view, on a clean \
                 white background.",
            ),
            Self::Accessory => Some(
                "Extract the accessories from the image, front view, on a clean white \
                 background.",
            ),
            Self::Custom => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_terminality() {
        assert!(!GenerationStatus::Pending.is_terminal());
        assert!(GenerationStatus::Completed.is_terminal());
        assert!(GenerationStatus::Failed.is_terminal());
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [
            GenerationStatus::Pending,
            GenerationStatus::Completed,
            GenerationStatus::Failed,
        ] {
            assert_eq!(
                status.as_str().parse::<GenerationStatus>().unwrap(),
                status
            );
        }
    }

    #[test]
    fn presets_cover_everything_but_custom() {
        assert!(ExtractType::FullBody.preset_prompt().is_some());
        assert!(ExtractType::Custom.preset_prompt().is_none());
    }
}
