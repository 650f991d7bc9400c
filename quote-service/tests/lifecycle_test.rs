//! Status transition integration tests for quote-service.

mod common;

use common::{create_quote_json, TestApp, TEST_OWNER_ID};
use serde_json::json;

async fn seeded_quote(app: &TestApp) -> String {
    let owner = app.owner_id();
    let client_id = app.seed_client(owner, "Lifecycle Client").await;
    let product_id = app.seed_product(owner, "Girder").await;
    let body = create_quote_json(
        app,
        TEST_OWNER_ID,
        client_id,
        "Lifecycle quote",
        json!([{ "product_id": product_id, "quantity": 1, "unit_price": "100.00" }]),
    )
    .await;
    body["quote_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn status_can_move_forward() {
    let app = TestApp::spawn().await;
    let quote_id = seeded_quote(&app).await;

    let response = app
        .put_json(
            TEST_OWNER_ID,
            &format!("/quotes/{}/status", quote_id),
            &json!({ "status": "sent" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["status"], "sent");

    let response = app
        .put_json(
            TEST_OWNER_ID,
            &format!("/quotes/{}/status", quote_id),
            &json!({ "status": "accepted" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn permissive_policy_allows_moving_back() {
    let app = TestApp::spawn().await;
    let quote_id = seeded_quote(&app).await;

    for status in ["sent", "accepted", "draft"] {
        let response = app
            .put_json(
                TEST_OWNER_ID,
                &format!("/quotes/{}/status", quote_id),
                &json!({ "status": status }),
            )
            .await;
        assert_eq!(response.status(), 200, "Transition to {} failed", status);
    }

    app.cleanup().await;
}

#[tokio::test]
async fn strict_policy_rejects_moving_back() {
    let app = TestApp::spawn_with(|config| config.strict_transitions = true).await;
    let quote_id = seeded_quote(&app).await;

    let response = app
        .put_json(
            TEST_OWNER_ID,
            &format!("/quotes/{}/status", quote_id),
            &json!({ "status": "sent" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .put_json(
            TEST_OWNER_ID,
            &format!("/quotes/{}/status", quote_id),
            &json!({ "status": "draft" }),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["success"], false);

    app.cleanup().await;
}

#[tokio::test]
async fn strict_policy_still_allows_same_status() {
    let app = TestApp::spawn_with(|config| config.strict_transitions = true).await;
    let quote_id = seeded_quote(&app).await;

    let response = app
        .put_json(
            TEST_OWNER_ID,
            &format!("/quotes/{}/status", quote_id),
            &json!({ "status": "draft" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_status_literal_is_rejected() {
    let app = TestApp::spawn().await;
    let quote_id = seeded_quote(&app).await;

    let response = app
        .put_json(
            TEST_OWNER_ID,
            &format!("/quotes/{}/status", quote_id),
            &json!({ "status": "archived" }),
        )
        .await;
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn status_update_on_unknown_quote_returns_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .put_json(
            TEST_OWNER_ID,
            "/quotes/99999999-9999-9999-9999-999999999999/status",
            &json!({ "status": "sent" }),
        )
        .await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}
