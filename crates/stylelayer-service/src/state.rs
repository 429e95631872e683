//! Application state.

use std::sync::Arc;

use stylelayer_store::SqliteStore;

use crate::config::ServiceConfig;
use crate::google::GoogleOauthClient;
use crate::paypal::PayPalClient;
use crate::vision::VisionClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<SqliteStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Google OAuth client (optional).
    pub google: Option<Arc<GoogleOauthClient>>,

    /// Vision generation client (optional).
    pub vision: Option<Arc<VisionClient>>,

    /// PayPal client for subscriptions (optional).
    pub paypal: Option<Arc<PayPalClient>>,
}

impl AppState {
    /// Create a new application state, wiring up whichever external
    /// integrations the configuration provides credentials for.
    #[must_use]
    pub fn new(store: Arc<SqliteStore>, config: ServiceConfig) -> Self {
        let google = config
            .google_client_id
            .as_ref()
            .zip(config.google_client_secret.as_ref())
            .map(|(id, secret)| {
                tracing::info!("Google OAuth enabled");
                Arc::new(GoogleOauthClient::new(
                    id,
                    secret,
                    &config.google_auth_url,
                    &config.google_token_url,
                    &config.google_userinfo_url,
                ))
            });

        if google.is_none() {
            tracing::warn!("Google OAuth not configured - sign-in will be unavailable");
        }

        let vision = config
            .vision_api_url
            .as_ref()
            .zip(config.vision_api_key.as_ref())
            .map(|(url, key)| {
                tracing::info!(vision_url = %url, "Vision API enabled");
                Arc::new(VisionClient::new(url, key))
            });

        if vision.is_none() {
            tracing::warn!("Vision API not configured - generation will be unavailable");
        }

        let paypal = config
            .paypal_client_id
            .as_ref()
            .zip(config.paypal_client_secret.as_ref())
            .map(|(id, secret)| {
                tracing::info!(paypal_url = %config.paypal_api_url, "PayPal integration enabled");
                Arc::new(PayPalClient::new(&config.paypal_api_url, id, secret))
            });

        if paypal.is_none() {
            tracing::warn!("PayPal not configured - subscriptions will be unavailable");
        }

        Self {
            store,
            config,
            google,
            vision,
            paypal,
        }
    }

    /// Whether the service is served over HTTPS (controls the Secure
    /// cookie flag).
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.config.public_url.starts_with("https://")
    }
}
