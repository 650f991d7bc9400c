//! Public sharing integration tests for quote-service.

mod common;

use common::{create_quote_json, TestApp, TEST_OWNER_ID};
use serde_json::json;

async fn sent_quote(app: &TestApp) -> (String, String) {
    let owner = app.owner_id();
    let client_id = app.seed_client(owner, "Public Client").await;
    let product_id = app.seed_product(owner, "Panel").await;
    let body = create_quote_json(
        app,
        TEST_OWNER_ID,
        client_id,
        "Shared quote",
        json!([{ "product_id": product_id, "quantity": 4, "unit_price": "25.00" }]),
    )
    .await;
    let quote_id = body["quote_id"].as_str().unwrap().to_string();
    let public_id = body["public_id"].as_str().unwrap().to_string();

    app.put_json(
        TEST_OWNER_ID,
        &format!("/quotes/{}/status", quote_id),
        &json!({ "status": "sent" }),
    )
    .await;

    (quote_id, public_id)
}

#[tokio::test]
async fn public_view_omits_internal_identifiers() {
    let app = TestApp::spawn().await;
    let (_, public_id) = sent_quote(&app).await;

    let response = app
        .client
        .get(format!("{}/quotes/public/{}", app.address, public_id))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");

    assert_eq!(body["public_id"], public_id);
    assert_eq!(body["title"], "Shared quote");
    assert_eq!(body["total"], "100.00");
    assert_eq!(body["client"]["name"], "Public Client");
    assert_eq!(body["items"][0]["display_name"], "Panel");

    // Nothing internal leaks
    assert!(body.get("owner_id").is_none());
    assert!(body.get("quote_id").is_none());
    assert!(body["client"].get("client_id").is_none());
    assert!(body["items"][0].get("product_id").is_none());

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_public_id_returns_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/quotes/public/{}", app.address, "nosuchtoken0000000000aa"))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["success"], false);

    app.cleanup().await;
}

#[tokio::test]
async fn accepting_a_sent_quote_records_the_response() {
    let app = TestApp::spawn().await;
    let (quote_id, public_id) = sent_quote(&app).await;

    let response = app
        .client
        .put(format!("{}/quotes/public/{}/response", app.address, public_id))
        .json(&json!({ "accepted": true, "message": "Looks good, go ahead." }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["response_message"], "Looks good, go ahead.");

    // The owner sees the response too
    let response = app
        .get(TEST_OWNER_ID, &format!("/quotes/{}", quote_id))
        .await;
    let owner_view: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(owner_view["status"], "accepted");
    assert!(owner_view["responded_utc"].is_string());

    app.cleanup().await;
}

#[tokio::test]
async fn rejecting_a_sent_quote_records_the_response() {
    let app = TestApp::spawn().await;
    let (_, public_id) = sent_quote(&app).await;

    let response = app
        .client
        .put(format!("{}/quotes/public/{}/response", app.address, public_id))
        .json(&json!({ "accepted": false }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["status"], "rejected");

    app.cleanup().await;
}

#[tokio::test]
async fn responding_twice_is_rejected() {
    let app = TestApp::spawn().await;
    let (_, public_id) = sent_quote(&app).await;

    let url = format!("{}/quotes/public/{}/response", app.address, public_id);
    let response = app
        .client
        .put(&url)
        .json(&json!({ "accepted": true }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);

    let response = app
        .client
        .put(&url)
        .json(&json!({ "accepted": false }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn responding_to_a_draft_quote_is_rejected() {
    let app = TestApp::spawn().await;
    let owner = app.owner_id();
    let client_id = app.seed_client(owner, "Draft Client").await;
    let product_id = app.seed_product(owner, "Stud").await;

    let body = create_quote_json(
        &app,
        TEST_OWNER_ID,
        client_id,
        "Still a draft",
        json!([{ "product_id": product_id, "quantity": 1, "unit_price": "10.00" }]),
    )
    .await;
    let public_id = body["public_id"].as_str().unwrap();

    let response = app
        .client
        .put(format!("{}/quotes/public/{}/response", app.address, public_id))
        .json(&json!({ "accepted": true }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 400);

    app.cleanup().await;
}
