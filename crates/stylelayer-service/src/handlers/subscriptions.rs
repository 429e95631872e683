//! PayPal subscription checkout and return-redirect handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::Json;
use serde::{Deserialize, Serialize};

use stylelayer_core::{BillingCycle, Plan};
use stylelayer_store::ActivationOutcome;

use crate::auth::AuthSession;
use crate::error::ApiError;
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    /// The plan to subscribe to.
    pub plan: Plan,
    /// Billing cycle; monthly when omitted.
    pub billing_cycle: Option<BillingCycle>,
}

/// Checkout response.
#[derive(Debug, Serialize)]
pub struct CreateSubscriptionResponse {
    /// The PayPal subscription id, stored as PENDING.
    pub subscription_id: String,
    /// URL the user must visit to approve payment.
    pub approval_url: String,
}

/// Query parameters PayPal appends to the return redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// The subscription being approved.
    pub subscription_id: Option<String>,
}

/// `POST /api/paypal/create-subscription` - start checkout for a paid plan.
///
/// Creates the subscription with PayPal and mirrors it locally as PENDING.
/// No credits move until activation.
pub async fn create_subscription(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<Json<CreateSubscriptionResponse>, ApiError> {
    if request.plan == Plan::Free {
        return Err(ApiError::BadRequest("cannot subscribe to the free plan".into()));
    }
    let cycle = request.billing_cycle.unwrap_or(BillingCycle::Monthly);

    let plan_id = state
        .config
        .paypal_plan_id(request.plan, cycle)
        .ok_or_else(|| {
            ApiError::BadRequest(format!(
                "no PayPal plan configured for {} {}",
                request.plan, cycle
            ))
        })?
        .to_string();

    let paypal = state
        .paypal
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("billing is not configured".into()))?;

    let return_url = format!(
        "{}/api/paypal/subscription-callback",
        state.config.public_url
    );
    let cancel_url = format!("{}/pricing", state.config.frontend_url);

    let checkout = paypal
        .create_subscription(&plan_id, &return_url, &cancel_url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, plan = %request.plan, "PayPal checkout creation failed");
            ApiError::ExternalService("failed to create subscription".into())
        })?;

    state
        .store
        .create_pending_subscription(
            &session.user.identity_id,
            &checkout.subscription_id,
            request.plan,
            cycle,
            request.plan.monthly_credits(),
        )
        .await?;

    tracing::info!(
        identity_id = %session.user.identity_id,
        paypal_subscription_id = %checkout.subscription_id,
        plan = %request.plan,
        cycle = %cycle,
        "Checkout started"
    );

    Ok(Json(CreateSubscriptionResponse {
        subscription_id: checkout.subscription_id,
        approval_url: checkout.approval_url,
    }))
}

/// `GET /api/paypal/subscription-callback` - the return redirect after the
/// user approves payment.
///
/// Verifies the subscription state with PayPal before activating; the
/// query string alone is never trusted. Activation is idempotent against
/// the webhook racing this handler.
pub async fn subscription_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    let Some(subscription_id) = query.subscription_id else {
        return pricing_error(&state, "missing_subscription_id");
    };
    let Some(paypal) = state.paypal.as_ref() else {
        return pricing_error(&state, "not_configured");
    };

    let details = match paypal.get_subscription(&subscription_id).await {
        Ok(details) => details,
        Err(e) => {
            tracing::error!(paypal_subscription_id = %subscription_id, error = %e, "Subscription lookup failed");
            return pricing_error(&state, "verification_failed");
        }
    };

    if !details.is_approved() {
        tracing::warn!(
            paypal_subscription_id = %subscription_id,
            status = %details.status,
            "Subscription not approved at callback"
        );
        return pricing_error(&state, "not_approved");
    }

    match state.store.activate_subscription(&subscription_id).await {
        Ok(ActivationOutcome::Activated { plan, credits_granted }) => {
            tracing::info!(
                paypal_subscription_id = %subscription_id,
                plan = %plan,
                credits_granted,
                "Subscription activated via callback"
            );
            dashboard_redirect(&state)
        }
        // The webhook won the race; the user still lands on a success page.
        Ok(ActivationOutcome::AlreadyProcessed) => dashboard_redirect(&state),
        Ok(ActivationOutcome::NotFound) => {
            tracing::warn!(paypal_subscription_id = %subscription_id, "Callback for unknown subscription");
            pricing_error(&state, "unknown_subscription")
        }
        Err(e) => {
            tracing::error!(paypal_subscription_id = %subscription_id, error = %e, "Activation failed");
            pricing_error(&state, "activation_failed")
        }
    }
}

fn dashboard_redirect(state: &AppState) -> Redirect {
    Redirect::to(&format!(
        "{}/dashboard?subscription=activated",
        state.config.frontend_url
    ))
}

fn pricing_error(state: &AppState, code: &str) -> Redirect {
    Redirect::to(&format!(
        "{}/pricing?error={code}",
        state.config.frontend_url
    ))
}
