//! PayPal webhook handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use stylelayer_core::SubscriptionStatus;
use stylelayer_store::ActivationOutcome;

use crate::state::AppState;

/// PayPal webhook envelope.
#[derive(Debug, Deserialize)]
pub struct PayPalWebhook {
    /// Event id.
    #[serde(default)]
    pub id: Option<String>,
    /// Event type, e.g. `BILLING.SUBSCRIPTION.ACTIVATED`.
    pub event_type: String,
    /// Event payload.
    #[serde(default)]
    pub resource: serde_json::Value,
}

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was processed.
    pub received: bool,
}

/// `POST /api/paypal/webhook` - subscription lifecycle events.
///
/// Always acknowledges with `{received: true}`, including on internal
/// failure: a non-2xx response makes PayPal redeliver the event in a
/// tightening loop, and every handler here is idempotent anyway.
pub async fn paypal_webhook(
    State(state): State<Arc<AppState>>,
    Json(webhook): Json<PayPalWebhook>,
) -> Json<WebhookResponse> {
    tracing::info!(
        event_type = %webhook.event_type,
        event_id = ?webhook.id,
        "Received PayPal webhook"
    );

    if let Err(e) = process_event(&state, &webhook).await {
        tracing::error!(
            event_type = %webhook.event_type,
            event_id = ?webhook.id,
            error = %e,
            "Webhook processing failed"
        );
    }

    Json(WebhookResponse { received: true })
}

async fn process_event(
    state: &AppState,
    webhook: &PayPalWebhook,
) -> Result<(), stylelayer_store::StoreError> {
    match webhook.event_type.as_str() {
        "BILLING.SUBSCRIPTION.ACTIVATED" => {
            let Some(subscription_id) = resource_id(webhook) else {
                tracing::warn!("Activation event without resource id");
                return Ok(());
            };

            match state.store.activate_subscription(subscription_id).await? {
                ActivationOutcome::Activated { plan, credits_granted } => {
                    tracing::info!(
                        paypal_subscription_id = %subscription_id,
                        plan = %plan,
                        credits_granted,
                        "Subscription activated via webhook"
                    );
                }
                ActivationOutcome::AlreadyProcessed => {
                    tracing::debug!(
                        paypal_subscription_id = %subscription_id,
                        "Activation already handled"
                    );
                }
                ActivationOutcome::NotFound => {
                    tracing::warn!(
                        paypal_subscription_id = %subscription_id,
                        "Activation for unknown subscription"
                    );
                }
            }
        }
        "BILLING.SUBSCRIPTION.CANCELLED" => {
            terminate(state, webhook, SubscriptionStatus::Cancelled).await?;
        }
        "BILLING.SUBSCRIPTION.EXPIRED" => {
            terminate(state, webhook, SubscriptionStatus::Expired).await?;
        }
        "BILLING.SUBSCRIPTION.SUSPENDED" => {
            terminate(state, webhook, SubscriptionStatus::Suspended).await?;
        }
        "PAYMENT.SALE.COMPLETED" => {
            // Recurring payments reference the subscription through the
            // billing agreement id, not the resource id.
            let Some(subscription_id) = webhook
                .resource
                .get("billing_agreement_id")
                .and_then(|v| v.as_str())
            else {
                tracing::debug!("Sale event without billing agreement id, ignoring");
                return Ok(());
            };

            match state.store.record_recurring_payment(subscription_id).await? {
                Some(credits) => {
                    tracing::info!(
                        paypal_subscription_id = %subscription_id,
                        credits_granted = credits,
                        "Recurring payment processed"
                    );
                }
                None => {
                    tracing::warn!(
                        paypal_subscription_id = %subscription_id,
                        "Sale for a subscription that is not active"
                    );
                }
            }
        }
        other => {
            tracing::debug!(event_type = %other, "Unhandled PayPal event");
        }
    }

    Ok(())
}

async fn terminate(
    state: &AppState,
    webhook: &PayPalWebhook,
    status: SubscriptionStatus,
) -> Result<(), stylelayer_store::StoreError> {
    let Some(subscription_id) = resource_id(webhook) else {
        tracing::warn!(status = %status, "Termination event without resource id");
        return Ok(());
    };

    let transitioned = state
        .store
        .terminate_subscription(subscription_id, status)
        .await?;

    if transitioned {
        tracing::info!(paypal_subscription_id = %subscription_id, status = %status, "Subscription terminated");
    } else {
        tracing::debug!(
            paypal_subscription_id = %subscription_id,
            status = %status,
            "Termination already handled or subscription unknown"
        );
    }

    Ok(())
}

fn resource_id(webhook: &PayPalWebhook) -> Option<&str> {
    webhook.resource.get("id").and_then(|v| v.as_str())
}
