//! PayPal API client implementation.

use std::time::Duration;

use reqwest::Client;

use super::types::{
    ApplicationContext, CreateSubscriptionRequest, SubscriptionDetails, SubscriptionResponse,
    TokenResponse,
};

/// Error type for PayPal operations.
#[derive(Debug, thiserror::Error)]
pub enum PayPalError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// PayPal API returned an error.
    #[error("PayPal API error: {status} - {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A created subscription came back without an approval link.
    #[error("subscription response missing approval link")]
    MissingApprovalLink,
}

/// A freshly created subscription awaiting user approval.
#[derive(Debug, Clone)]
pub struct PendingCheckout {
    /// The PayPal subscription id.
    pub subscription_id: String,
    /// URL the user must visit to approve payment.
    pub approval_url: String,
}

/// PayPal API client.
#[derive(Debug, Clone)]
pub struct PayPalClient {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl PayPalClient {
    /// Create a new PayPal client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Fetch an access token via the client-credentials grant.
    async fn get_access_token(&self) -> Result<String, PayPalError> {
        let url = format!("{}/v1/oauth2/token", self.base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let token: TokenResponse = Self::handle_response(response).await?;
        Ok(token.access_token)
    }

    /// Create a subscription and return its id plus the approval URL the
    /// user must be sent to.
    pub async fn create_subscription(
        &self,
        plan_id: &str,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<PendingCheckout, PayPalError> {
        let token = self.get_access_token().await?;
        let url = format!("{}/v1/billing/subscriptions", self.base_url);

        let request = CreateSubscriptionRequest {
            plan_id: plan_id.to_string(),
            application_context: ApplicationContext {
                brand_name: "StyleLayer AI".to_string(),
                return_url: return_url.to_string(),
                cancel_url: cancel_url.to_string(),
                user_action: "SUBSCRIBE_NOW".to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {token}"))
            .json(&request)
            .send()
            .await?;

        let subscription: SubscriptionResponse = Self::handle_response(response).await?;

        let approval_url = subscription
            .links
            .into_iter()
            .find(|l| l.rel == "approve")
            .map(|l| l.href)
            .ok_or(PayPalError::MissingApprovalLink)?;

        Ok(PendingCheckout {
            subscription_id: subscription.id,
            approval_url,
        })
    }

    /// Look up a subscription's current state.
    pub async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<SubscriptionDetails, PayPalError> {
        let token = self.get_access_token().await?;
        let url = format!("{}/v1/billing/subscriptions/{subscription_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await?;

        Self::handle_response(response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PayPalError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PayPalError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
