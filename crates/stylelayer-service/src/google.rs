//! Google OAuth client (code exchange and userinfo).

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

/// Error type for Google OAuth operations.
#[derive(Debug, thiserror::Error)]
pub enum GoogleError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Google returned an error response.
    #[error("Google API error: {status} - {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Configuration error (bad URL, etc).
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Token exchange response.
#[derive(Debug, Deserialize)]
pub struct GoogleTokens {
    /// Bearer token for the userinfo call.
    pub access_token: String,
}

/// Userinfo response.
#[derive(Debug, Deserialize)]
pub struct GoogleUserInfo {
    /// Stable Google subject id.
    pub id: String,
    /// Verified email address.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub picture: Option<String>,
}

/// Google OAuth client.
#[derive(Debug, Clone)]
pub struct GoogleOauthClient {
    client: Client,
    client_id: String,
    client_secret: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleOauthClient {
    /// Create a new Google OAuth client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        userinfo_url: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: auth_url.into(),
            token_url: token_url.into(),
            userinfo_url: userinfo_url.into(),
        }
    }

    /// Build the consent screen URL the browser is redirected to.
    pub fn authorize_url(&self, redirect_uri: &str) -> Result<String, GoogleError> {
        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| GoogleError::Configuration(e.to_string()))?;

        Ok(url.into())
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<GoogleTokens, GoogleError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Fetch the signed-in user's profile.
    pub async fn fetch_userinfo(&self, access_token: &str) -> Result<GoogleUserInfo, GoogleError> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .header("Authorization", format!("Bearer {access_token}"))
            .send()
            .await?;

        Self::handle_response(response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GoogleError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GoogleError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
