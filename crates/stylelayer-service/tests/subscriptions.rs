//! PayPal checkout and activation-callback integration tests.

mod common;

use axum::http::StatusCode;
use common::{id, TestHarness};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stylelayer_core::{BillingCycle, Plan, SubscriptionStatus};
use stylelayer_service::ServiceConfig;

async fn harness_with_mock_paypal(paypal: &MockServer) -> TestHarness {
    let config = ServiceConfig {
        paypal_api_url: paypal.uri(),
        paypal_client_id: Some("test-paypal-id".into()),
        paypal_client_secret: Some("test-paypal-secret".into()),
        paypal_plan_influencer_monthly: Some("P-INF-MONTHLY".into()),
        ..TestHarness::test_config()
    };
    TestHarness::with_config(config).await
}

fn mock_token() -> Mock {
    Mock::given(method("POST"))
        .and(path("/v1/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-access-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
}

#[tokio::test]
async fn checkout_returns_approval_url_and_stores_pending() {
    let paypal = MockServer::start().await;
    mock_token().mount(&paypal).await;
    Mock::given(method("POST"))
        .and(path("/v1/billing/subscriptions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "I-CHECKOUT1",
            "status": "APPROVAL_PENDING",
            "links": [
                { "href": "https://www.paypal.example/approve?token=abc", "rel": "approve" },
                { "href": "https://api.paypal.example/self", "rel": "self" }
            ]
        })))
        .mount(&paypal)
        .await;

    let harness = harness_with_mock_paypal(&paypal).await;
    let cookie = harness.sign_in("g-600").await;

    let response = harness
        .server
        .post("/api/paypal/create-subscription")
        .add_header("cookie", cookie)
        .json(&json!({ "plan": "INFLUENCER" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["subscription_id"], "I-CHECKOUT1");
    assert_eq!(
        body["approval_url"],
        "https://www.paypal.example/approve?token=abc"
    );

    let sub = harness
        .store
        .get_subscription("I-CHECKOUT1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Pending);
    assert_eq!(sub.plan, Plan::Influencer);
    assert_eq!(sub.credits_per_month, 60);

    // Checkout alone moves no credits.
    assert_eq!(harness.balance("g-600").await, 3);
}

#[tokio::test]
async fn checkout_rejects_free_plan() {
    let paypal = MockServer::start().await;
    let harness = harness_with_mock_paypal(&paypal).await;
    let cookie = harness.sign_in("g-601").await;

    let response = harness
        .server
        .post("/api/paypal/create-subscription")
        .add_header("cookie", cookie)
        .json(&json!({ "plan": "FREE" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn checkout_rejects_unconfigured_plan() {
    let paypal = MockServer::start().await;
    let harness = harness_with_mock_paypal(&paypal).await;
    let cookie = harness.sign_in("g-602").await;

    // STUDIO_PRO has no PayPal plan id in this configuration.
    let response = harness
        .server
        .post("/api/paypal/create-subscription")
        .add_header("cookie", cookie)
        .json(&json!({ "plan": "STUDIO_PRO" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn callback_activates_after_paypal_verification() {
    let paypal = MockServer::start().await;
    mock_token().mount(&paypal).await;
    Mock::given(method("GET"))
        .and(path("/v1/billing/subscriptions/I-CB1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "I-CB1",
            "status": "ACTIVE"
        })))
        .mount(&paypal)
        .await;

    let harness = harness_with_mock_paypal(&paypal).await;
    harness.sign_in("g-603").await;
    harness
        .store
        .create_pending_subscription(
            &id("g-603"),
            "I-CB1",
            Plan::Influencer,
            BillingCycle::Monthly,
            60,
        )
        .await
        .unwrap();

    let response = harness
        .server
        .get("/api/paypal/subscription-callback?subscription_id=I-CB1")
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    let location = response.header("location").to_str().unwrap().to_string();
    assert!(location.contains("/dashboard?subscription=activated"));

    let user = harness.store.get_user(&id("g-603")).await.unwrap().unwrap();
    assert_eq!(user.plan, Plan::Influencer);
    assert_eq!(user.credits_balance, 3 + 60);

    // A second visit (reload, webhook race) grants nothing more.
    let response = harness
        .server
        .get("/api/paypal/subscription-callback?subscription_id=I-CB1")
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(harness.balance("g-603").await, 3 + 60);
}

#[tokio::test]
async fn callback_refuses_unapproved_subscription() {
    let paypal = MockServer::start().await;
    mock_token().mount(&paypal).await;
    Mock::given(method("GET"))
        .and(path("/v1/billing/subscriptions/I-CB2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "I-CB2",
            "status": "APPROVAL_PENDING"
        })))
        .mount(&paypal)
        .await;

    let harness = harness_with_mock_paypal(&paypal).await;
    harness.sign_in("g-604").await;
    harness
        .store
        .create_pending_subscription(
            &id("g-604"),
            "I-CB2",
            Plan::Influencer,
            BillingCycle::Monthly,
            60,
        )
        .await
        .unwrap();

    let response = harness
        .server
        .get("/api/paypal/subscription-callback?subscription_id=I-CB2")
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    let location = response.header("location").to_str().unwrap().to_string();
    assert!(location.contains("error=not_approved"));

    // Nothing was granted; the subscription stays PENDING.
    assert_eq!(harness.balance("g-604").await, 3);
    let sub = harness
        .store
        .get_subscription("I-CB2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Pending);
}
