//! Generation protocol integration tests.

mod common;

use axum::http::StatusCode;
use common::{id, TestHarness};
use serde_json::json;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stylelayer_core::ActionType;
use stylelayer_service::ServiceConfig;
use stylelayer_store::NewGeneration;

async fn harness_with_mock_vision(vision: &MockServer) -> TestHarness {
    let config = ServiceConfig {
        vision_api_url: Some(vision.uri()),
        vision_api_key: Some("test-vision-key".into()),
        ..TestHarness::test_config()
    };
    TestHarness::with_config(config).await
}

fn mock_submit_ok(task_id: &str) -> Mock {
    Mock::given(method("POST"))
        .and(query_param("Action", "CVSync2AsyncSubmitTask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 10000,
            "message": "Success",
            "data": { "task_id": task_id }
        })))
}

fn mock_result(status: &str, image_url: Option<&str>) -> Mock {
    let mut data = json!({ "status": status });
    if let Some(url) = image_url {
        data["image_urls"] = json!([url]);
    }
    Mock::given(method("POST"))
        .and(query_param("Action", "CVSync2AsyncGetResult"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 10000,
            "message": "Success",
            "data": data
        })))
}

fn mock_inline_result(b64: &str) -> Mock {
    Mock::given(method("POST"))
        .and(query_param("Action", "CVSync2AsyncGetResult"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 10000,
            "message": "Success",
            "data": { "status": "done", "binary_data_base64": [b64] }
        })))
}

fn generate_body() -> serde_json::Value {
    json!({
        "image_url": "https://img.example/outfit.jpg",
        "layout_style": "full_body"
    })
}

#[tokio::test]
async fn generate_requires_auth() {
    let harness = TestHarness::new().await;

    let response = harness.server.post("/api/generate").json(&generate_body()).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn generate_success_charges_one_credit() {
    let vision = MockServer::start().await;
    mock_submit_ok("task-1").mount(&vision).await;
    mock_result("done", Some("https://cdn.example/result.png"))
        .mount(&vision)
        .await;

    let harness = harness_with_mock_vision(&vision).await;
    let cookie = harness.sign_in("g-400").await;

    let response = harness
        .server
        .post("/api/generate")
        .add_header("cookie", cookie.clone())
        .json(&generate_body())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["result_url"], "https://cdn.example/result.png");

    assert_eq!(harness.balance("g-400").await, 2);

    // Ledger: onboarding +3, generation -1.
    let log = harness.store.list_credit_log(&id("g-400"), 10).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].action_type, ActionType::Generation);
    assert_eq!(log[0].amount, -1);
}

#[tokio::test]
async fn small_inline_result_becomes_a_data_url() {
    let vision = MockServer::start().await;
    mock_submit_ok("task-5").mount(&vision).await;
    mock_inline_result("aGVsbG8=").mount(&vision).await;

    let harness = harness_with_mock_vision(&vision).await;
    let cookie = harness.sign_in("g-407").await;

    let response = harness
        .server
        .post("/api/generate")
        .add_header("cookie", cookie)
        .json(&generate_body())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["result_url"], "data:image/png;base64,aGVsbG8=");
    assert_eq!(harness.balance("g-407").await, 2);
}

#[tokio::test]
async fn oversized_inline_result_is_refunded() {
    let vision = MockServer::start().await;
    mock_submit_ok("task-6").mount(&vision).await;
    // 6 MiB of base64 decodes to ~4.5 MiB, past the inline cap.
    let huge = "A".repeat(6 * 1024 * 1024);
    mock_inline_result(&huge).mount(&vision).await;

    let harness = harness_with_mock_vision(&vision).await;
    let cookie = harness.sign_in("g-408").await;

    let response = harness
        .server
        .post("/api/generate")
        .add_header("cookie", cookie)
        .json(&generate_body())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], false);
    assert_eq!(body["reason"], "result_too_large");

    // Charge and refund cancel out, with exactly one REFUND entry.
    assert_eq!(harness.balance("g-408").await, 3);
    let refunds = harness
        .store
        .list_credit_log(&id("g-408"), 10)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.action_type == ActionType::Refund)
        .count();
    assert_eq!(refunds, 1);
}

#[tokio::test]
async fn generate_refunds_when_submission_fails() {
    let vision = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("Action", "CVSync2AsyncSubmitTask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 50429,
            "message": "Rate limited"
        })))
        .mount(&vision)
        .await;

    let harness = harness_with_mock_vision(&vision).await;
    let cookie = harness.sign_in("g-401").await;

    let response = harness
        .server
        .post("/api/generate")
        .add_header("cookie", cookie)
        .json(&generate_body())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], false);
    assert_eq!(body["reason"], "submission_failed");

    // Charge and refund cancel out.
    assert_eq!(harness.balance("g-401").await, 3);
    let log = harness.store.list_credit_log(&id("g-401"), 10).await.unwrap();
    assert!(log.iter().any(|e| e.action_type == ActionType::Refund));
}

#[tokio::test]
async fn generate_refunds_on_poll_timeout() {
    let vision = MockServer::start().await;
    mock_submit_ok("task-2").mount(&vision).await;
    mock_result("generating", None).mount(&vision).await;

    let harness = harness_with_mock_vision(&vision).await;
    let cookie = harness.sign_in("g-402").await;

    let response = harness
        .server
        .post("/api/generate")
        .add_header("cookie", cookie)
        .json(&generate_body())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], false);
    assert_eq!(body["reason"], "timeout");
    assert_eq!(harness.balance("g-402").await, 3);
}

#[tokio::test]
async fn generate_refunds_when_task_is_lost() {
    let vision = MockServer::start().await;
    mock_submit_ok("task-3").mount(&vision).await;
    mock_result("not_found", None).mount(&vision).await;

    let harness = harness_with_mock_vision(&vision).await;
    let cookie = harness.sign_in("g-403").await;

    let response = harness
        .server
        .post("/api/generate")
        .add_header("cookie", cookie)
        .json(&generate_body())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], false);
    assert_eq!(body["reason"], "task_lost");
    assert_eq!(harness.balance("g-403").await, 3);
}

#[tokio::test]
async fn generate_rejects_insufficient_credits_without_charging() {
    let vision = MockServer::start().await;
    let harness = harness_with_mock_vision(&vision).await;
    let cookie = harness.sign_in("g-404").await;

    // Burn the onboarding credits directly through the store.
    for _ in 0..3 {
        let task = harness
            .store
            .reserve_generation(&NewGeneration {
                identity_id: id("g-404"),
                kind: "FULL_BODY".into(),
                original_url: "https://img.example/outfit.jpg".into(),
                prompt_used: "prompt".into(),
                cost: 1,
            })
            .await
            .unwrap();
        harness
            .store
            .complete_generation(&task.id, "https://cdn.example/r.png")
            .await
            .unwrap();
    }

    let response = harness
        .server
        .post("/api/generate")
        .add_header("cookie", cookie)
        .json(&generate_body())
        .await;

    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_credits");
    assert_eq!(body["error"]["details"]["balance"], 0);

    // No fourth charge was written.
    let log = harness.store.list_credit_log(&id("g-404"), 20).await.unwrap();
    assert_eq!(log.len(), 4);
}

#[tokio::test]
async fn custom_layout_requires_a_target() {
    let vision = MockServer::start().await;
    let harness = harness_with_mock_vision(&vision).await;
    let cookie = harness.sign_in("g-405").await;

    let response = harness
        .server
        .post("/api/generate")
        .add_header("cookie", cookie)
        .json(&json!({
            "image_url": "https://img.example/outfit.jpg",
            "layout_style": "custom"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    // Rejected before any charge.
    assert_eq!(harness.balance("g-405").await, 3);
}

#[tokio::test]
async fn generate_rejects_non_http_image_url() {
    let vision = MockServer::start().await;
    let harness = harness_with_mock_vision(&vision).await;
    let cookie = harness.sign_in("g-406").await;

    let response = harness
        .server
        .post("/api/generate")
        .add_header("cookie", cookie)
        .json(&json!({
            "image_url": "file:///etc/passwd",
            "layout_style": "shoes"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
