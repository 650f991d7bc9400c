//! Health and metrics endpoint tests for quote-service.

mod common;

use common::TestApp;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "quote-service");

    app.cleanup().await;
}

#[tokio::test]
async fn readiness_check_works() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/ready", app.address))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_text() {
    let app = TestApp::spawn().await;

    // Touch the database once so the query histogram has a sample
    app.get(common::TEST_OWNER_ID, "/quotes").await;

    let response = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("Invalid body");
    assert!(body.contains("quotes_db_query_duration_seconds"));

    app.cleanup().await;
}
