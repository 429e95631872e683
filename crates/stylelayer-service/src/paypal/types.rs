//! PayPal API wire types.

use serde::{Deserialize, Serialize};

/// OAuth2 client-credentials token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for API calls.
    pub access_token: String,
}

/// Subscription creation request.
#[derive(Debug, Serialize)]
pub struct CreateSubscriptionRequest {
    /// The PayPal billing plan to subscribe to.
    pub plan_id: String,
    /// Redirect URLs for the approval flow.
    pub application_context: ApplicationContext,
}

/// Approval flow redirect configuration.
#[derive(Debug, Serialize)]
pub struct ApplicationContext {
    /// Branding shown on the approval page.
    pub brand_name: String,
    /// Where PayPal sends the user after approval.
    pub return_url: String,
    /// Where PayPal sends the user if they abandon checkout.
    pub cancel_url: String,
    /// Approval UX mode.
    pub user_action: String,
}

/// HATEOAS link in a subscription response.
#[derive(Debug, Deserialize)]
pub struct Link {
    /// Target URL.
    pub href: String,
    /// Link relation (e.g. "approve").
    pub rel: String,
}

/// Subscription creation response.
#[derive(Debug, Deserialize)]
pub struct SubscriptionResponse {
    /// The new subscription id ("I-..." format).
    pub id: String,
    /// Current status.
    pub status: String,
    /// Related links, including the approval URL.
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Subscription details as returned by a lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionDetails {
    /// Subscription id.
    pub id: String,
    /// Status: `APPROVAL_PENDING`, APPROVED, ACTIVE, SUSPENDED, CANCELLED,
    /// EXPIRED.
    pub status: String,
}

impl SubscriptionDetails {
    /// Whether the subscriber has approved payment.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self.status.as_str(), "ACTIVE" | "APPROVED")
    }
}
