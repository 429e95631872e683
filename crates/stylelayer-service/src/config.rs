//! Service configuration.

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// SQLite database URL (default: "sqlite://stylelayer.db").
    pub database_url: String,

    /// Externally visible base URL of this service, used for OAuth and
    /// PayPal return redirects (default: `http://localhost:8080`).
    pub public_url: String,

    /// Frontend URL for post-auth and checkout redirects.
    pub frontend_url: String,

    /// Secret for signing the one-time handoff token.
    pub session_secret: String,

    /// Session lifetime in days.
    pub session_ttl_days: i64,

    /// Google OAuth client id (optional; sign-in disabled without it).
    pub google_client_id: Option<String>,

    /// Google OAuth client secret (optional).
    pub google_client_secret: Option<String>,

    /// Google consent screen URL.
    pub google_auth_url: String,

    /// Google token exchange URL.
    pub google_token_url: String,

    /// Google userinfo URL.
    pub google_userinfo_url: String,

    /// Vision generation API base URL (optional).
    pub vision_api_url: Option<String>,

    /// Vision generation API key (optional).
    pub vision_api_key: Option<String>,

    /// Delay between result polls, in milliseconds.
    pub vision_poll_interval_ms: u64,

    /// Maximum number of result polls before giving up.
    pub vision_poll_attempts: u32,

    /// PayPal API base URL (sandbox or live).
    pub paypal_api_url: String,

    /// PayPal client id (optional; billing disabled without it).
    pub paypal_client_id: Option<String>,

    /// PayPal client secret (optional).
    pub paypal_client_secret: Option<String>,

    /// PayPal plan id for INFLUENCER monthly.
    pub paypal_plan_influencer_monthly: Option<String>,

    /// PayPal plan id for INFLUENCER annual.
    pub paypal_plan_influencer_annual: Option<String>,

    /// PayPal plan id for `STUDIO_PRO` monthly.
    pub paypal_plan_studio_pro_monthly: Option<String>,

    /// PayPal plan id for `STUDIO_PRO` annual.
    pub paypal_plan_studio_pro_annual: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds. Must exceed the generation poll window
    /// (poll interval times poll attempts).
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://stylelayer.db".into()),
            public_url: std::env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            session_secret: std::env::var("SESSION_SECRET")
                .unwrap_or_else(|_| "dev-only-insecure-secret".into()),
            session_ttl_days: std::env::var("SESSION_TTL_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(7),
            google_client_id: std::env::var("GOOGLE_CLIENT_ID").ok(),
            google_client_secret: std::env::var("GOOGLE_CLIENT_SECRET").ok(),
            google_auth_url: std::env::var("GOOGLE_AUTH_URL")
                .unwrap_or_else(|_| "https://accounts.google.com/o/oauth2/v2/auth".into()),
            google_token_url: std::env::var("GOOGLE_TOKEN_URL")
                .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".into()),
            google_userinfo_url: std::env::var("GOOGLE_USERINFO_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/oauth2/v2/userinfo".into()),
            vision_api_url: std::env::var("VISION_API_URL").ok(),
            vision_api_key: std::env::var("VISION_API_KEY").ok(),
            vision_poll_interval_ms: std::env::var("VISION_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2000),
            vision_poll_attempts: std::env::var("VISION_POLL_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            paypal_api_url: std::env::var("PAYPAL_API_URL")
                .unwrap_or_else(|_| "https://api-m.sandbox.paypal.com".into()),
            paypal_client_id: std::env::var("PAYPAL_CLIENT_ID").ok(),
            paypal_client_secret: std::env::var("PAYPAL_CLIENT_SECRET").ok(),
            paypal_plan_influencer_monthly: std::env::var("PAYPAL_PLAN_INFLUENCER_MONTHLY").ok(),
            paypal_plan_influencer_annual: std::env::var("PAYPAL_PLAN_INFLUENCER_ANNUAL").ok(),
            paypal_plan_studio_pro_monthly: std::env::var("PAYPAL_PLAN_STUDIO_PRO_MONTHLY").ok(),
            paypal_plan_studio_pro_annual: std::env::var("PAYPAL_PLAN_STUDIO_PRO_ANNUAL").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(180),
        }
    }

    /// Resolve the PayPal plan id for a plan and billing cycle, if configured.
    #[must_use]
    pub fn paypal_plan_id(
        &self,
        plan: stylelayer_core::Plan,
        cycle: stylelayer_core::BillingCycle,
    ) -> Option<&str> {
        use stylelayer_core::{BillingCycle, Plan};

        match (plan, cycle) {
            (Plan::Influencer, BillingCycle::Monthly) => {
                self.paypal_plan_influencer_monthly.as_deref()
            }
            (Plan::Influencer, BillingCycle::Annual) => {
                self.paypal_plan_influencer_annual.as_deref()
            }
            (Plan::StudioPro, BillingCycle::Monthly) => {
                self.paypal_plan_studio_pro_monthly.as_deref()
            }
            (Plan::StudioPro, BillingCycle::Annual) => {
                self.paypal_plan_studio_pro_annual.as_deref()
            }
            (Plan::Free, _) => None,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            database_url: "sqlite://stylelayer.db".into(),
            public_url: "http://localhost:8080".into(),
            frontend_url: "http://localhost:3000".into(),
            session_secret: "dev-only-insecure-secret".into(),
            session_ttl_days: 7,
            google_client_id: None,
            google_client_secret: None,
            google_auth_url: "https://accounts.google.com/o/oauth2/v2/auth".into(),
            google_token_url: "https://oauth2.googleapis.com/token".into(),
            google_userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".into(),
            vision_api_url: None,
            vision_api_key: None,
            vision_poll_interval_ms: 2000,
            vision_poll_attempts: 60,
            paypal_api_url: "https://api-m.sandbox.paypal.com".into(),
            paypal_client_id: None,
            paypal_client_secret: None,
            paypal_plan_influencer_monthly: None,
            paypal_plan_influencer_annual: None,
            paypal_plan_studio_pro_monthly: None,
            paypal_plan_studio_pro_annual: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 180,
        }
    }
}
