use crate::common::{TestApp, TestAppOptions};
use serde_json::Value;

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let app = TestApp::spawn_lazy(TestAppOptions::default()).await;

    let response = app
        .client
        .get(app.url("/api/does-not-exist"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Route not found");
    assert_eq!(body["path"], "/api/does-not-exist");
}

#[tokio::test]
async fn test_protected_route_without_token_returns_401() {
    let app = TestApp::spawn_lazy(TestAppOptions::default()).await;

    let response = app
        .client
        .get(app.url("/api/users/profile"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Access token required");
}

#[tokio::test]
async fn test_protected_route_with_garbage_token_returns_403() {
    let app = TestApp::spawn_lazy(TestAppOptions::default()).await;

    let response = app
        .client
        .get(app.url("/api/users/profile"))
        .header("Authorization", "Bearer not-a-jwt")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_non_bearer_scheme_returns_403() {
    let app = TestApp::spawn_lazy(TestAppOptions::default()).await;

    let response = app
        .client
        .post(app.url("/api/messages"))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_notification_stream_requires_token() {
    let app = TestApp::spawn_lazy(TestAppOptions::default()).await;

    let response = app
        .client
        .get(app.url("/api/notifications/stream"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_malformed_uuid_in_path_returns_json_400() {
    let app = TestApp::spawn_lazy(TestAppOptions::default()).await;

    let response = app
        .client
        .get(app.url("/api/books/not-a-uuid"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["fields"]["path"].is_string());
}

#[tokio::test]
async fn test_unparseable_date_in_body_returns_json_400() {
    let app = TestApp::spawn_lazy(TestAppOptions::default()).await;

    let response = app
        .client
        .post(app.url("/api/rentals/rent"))
        .json(&serde_json::json!({
            "book_id": "0191a7c0-0000-7000-8000-000000000001",
            "renter_id": "0191a7c0-0000-7000-8000-000000000002",
            "rental_date": "March 1st",
            "expected_return_date": "2025-03-15"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].is_string());
    assert!(body["fields"]["body"].is_string());
}

#[tokio::test]
async fn test_body_without_json_content_type_returns_json_400() {
    let app = TestApp::spawn_lazy(TestAppOptions::default()).await;

    let response = app
        .client
        .post(app.url("/api/categories"))
        .body("name=Poetry")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_rental_status_filter_returns_json_400() {
    let app = TestApp::spawn_lazy(TestAppOptions::default()).await;

    let response = app
        .client
        .get(app.url("/api/rentals?status=lost"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["fields"]["query"].is_string());
}
