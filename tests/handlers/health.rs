use crate::common::{TestApp, TestAppOptions};
use serde_json::Value;

#[tokio::test]
async fn test_health_reports_connected_database() {
    let app = TestApp::spawn().await;

    let response = app.client.get(app.url("/api/health")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_health_answers_even_without_database() {
    let app = TestApp::spawn_lazy(TestAppOptions::default()).await;

    let response = app.client.get(app.url("/api/health")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}
