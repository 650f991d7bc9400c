//! Quote duplication integration tests for quote-service.

mod common;

use common::{create_quote_json, TestApp, OTHER_OWNER_ID, TEST_OWNER_ID};
use serde_json::json;

#[tokio::test]
async fn duplicate_resets_status_and_issues_fresh_ids() {
    let app = TestApp::spawn().await;
    let owner = app.owner_id();
    let client_id = app.seed_client(owner, "Copy Client").await;
    let product_id = app.seed_product(owner, "Flange").await;

    let source = create_quote_json(
        &app,
        TEST_OWNER_ID,
        client_id,
        "Winter order",
        json!([{ "product_id": product_id, "quantity": 2, "unit_price": "75.00" }]),
    )
    .await;
    let source_id = source["quote_id"].as_str().unwrap().to_string();

    // Send it and give it a validity window so the reset is observable
    app.put_json(
        TEST_OWNER_ID,
        &format!("/quotes/{}", source_id),
        &json!({ "valid_until": "2026-12-31" }),
    )
    .await;
    app.put_json(
        TEST_OWNER_ID,
        &format!("/quotes/{}/status", source_id),
        &json!({ "status": "sent" }),
    )
    .await;

    let response = app
        .post_json(
            TEST_OWNER_ID,
            &format!("/quotes/{}/duplicate", source_id),
            &json!({}),
        )
        .await;
    assert_eq!(response.status(), 201);
    let copy: serde_json::Value = response.json().await.expect("Invalid JSON");

    assert_ne!(copy["quote_id"], source["quote_id"]);
    assert_ne!(copy["public_id"], source["public_id"]);
    assert_eq!(copy["title"], "Winter order (copy)");
    assert_eq!(copy["status"], "draft");
    assert!(copy["valid_until"].is_null());
    assert_eq!(copy["subtotal"], source["subtotal"]);
    assert_eq!(copy["total"], source["total"]);
    assert_eq!(copy["items"].as_array().unwrap().len(), 1);
    assert_eq!(copy["items"][0]["quantity"], 2);

    // The source is untouched
    let response = app
        .get(TEST_OWNER_ID, &format!("/quotes/{}", source_id))
        .await;
    let source_after: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(source_after["status"], "sent");
    assert_eq!(source_after["title"], "Winter order");

    app.cleanup().await;
}

#[tokio::test]
async fn duplicating_a_duplicate_preserves_items_and_totals() {
    let app = TestApp::spawn().await;
    let owner = app.owner_id();
    let client_id = app.seed_client(owner, "Chain Client").await;
    let p1 = app.seed_product(owner, "Angle").await;
    let p2 = app.seed_product(owner, "Channel").await;
    let s1 = app.seed_service(owner, "Cutting").await;

    let original = create_quote_json(
        &app,
        TEST_OWNER_ID,
        client_id,
        "Chain order",
        json!([
            { "product_id": p1, "quantity": 3, "unit_price": "12.50" },
            { "product_id": p2, "quantity": 1, "unit_price": "99.99" },
            { "service_id": s1, "quantity": 2, "unit_price": "45.00" }
        ]),
    )
    .await;
    let original_id = original["quote_id"].as_str().unwrap();

    let first = app
        .post_json(
            TEST_OWNER_ID,
            &format!("/quotes/{}/duplicate", original_id),
            &json!({}),
        )
        .await;
    let first: serde_json::Value = first.json().await.expect("Invalid JSON");
    let first_id = first["quote_id"].as_str().unwrap();

    let second = app
        .post_json(
            TEST_OWNER_ID,
            &format!("/quotes/{}/duplicate", first_id),
            &json!({}),
        )
        .await;
    let second: serde_json::Value = second.json().await.expect("Invalid JSON");

    assert_eq!(second["status"], "draft");
    assert_eq!(second["subtotal"], original["subtotal"]);
    assert_eq!(second["total"], original["total"]);
    assert_ne!(second["quote_id"], original["quote_id"]);
    assert_ne!(second["public_id"], first["public_id"]);

    let original_items = original["items"].as_array().unwrap();
    let second_items = second["items"].as_array().unwrap();
    assert_eq!(second_items.len(), 3);
    for (a, b) in original_items.iter().zip(second_items) {
        assert_eq!(a["quantity"], b["quantity"]);
        assert_eq!(a["unit_price"], b["unit_price"]);
        assert_eq!(a["total"], b["total"]);
        assert_ne!(a["item_id"], b["item_id"]);
    }

    app.cleanup().await;
}

#[tokio::test]
async fn duplicate_across_owners_returns_not_found() {
    let app = TestApp::spawn().await;
    let owner = app.owner_id();
    let client_id = app.seed_client(owner, "Guarded Client").await;
    let product_id = app.seed_product(owner, "Bolt").await;

    let source = create_quote_json(
        &app,
        TEST_OWNER_ID,
        client_id,
        "Guarded",
        json!([{ "product_id": product_id, "quantity": 1, "unit_price": "5.00" }]),
    )
    .await;
    let source_id = source["quote_id"].as_str().unwrap();

    let response = app
        .post_json(
            OTHER_OWNER_ID,
            &format!("/quotes/{}/duplicate", source_id),
            &json!({}),
        )
        .await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}
