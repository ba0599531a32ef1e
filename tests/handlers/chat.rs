use crate::common::{TestApp, TestAppOptions, create_book, register_and_login};
use bookineo::services::chat::REFUSAL;
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }
        ]
    })
}

#[tokio::test]
async fn test_off_topic_question_is_refused_without_model_or_database() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("should not happen")))
        .expect(0)
        .mount(&server)
        .await;
    // The lazy pool points at no reachable database in CI; the refusal must not need it.
    let app = TestApp::spawn_lazy(TestAppOptions {
        chat_base_url: Some(server.uri()),
        ..Default::default()
    })
    .await;

    let response = app
        .client
        .post(app.url("/api/chat"))
        .json(&json!({ "message": "What's the weather like in Paris?" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], REFUSAL);
}

#[tokio::test]
async fn test_empty_message_returns_400() {
    let app = TestApp::spawn_lazy(TestAppOptions::default()).await;

    let response = app
        .client
        .post(app.url("/api/chat"))
        .json(&json!({ "message": "   " }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_catalog_question_is_answered_with_catalog_context() {
    let server = MockServer::start().await;
    let app = TestApp::spawn_with(TestAppOptions {
        chat_base_url: Some(server.uri()),
        ..Default::default()
    })
    .await;
    let owner = register_and_login(&app, "chatowner").await;
    let title = format!("Chatty {}", nanoid::nanoid!(8, &nanoid::alphabet::SAFE));
    create_book(&app, owner.id, &title).await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("CATALOG"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion("Try one of our mystery novels.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = app
        .client
        .post(app.url("/api/chat"))
        .json(&json!({
            "message": "Can you recommend a book?",
            "history": [
                { "role": "user", "content": "Hello" },
                { "role": "assistant", "content": "Hi! Looking for a book?" }
            ]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "Try one of our mystery novels.");
}

#[tokio::test]
async fn test_model_failure_returns_chatbot_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&server)
        .await;
    let app = TestApp::spawn_with(TestAppOptions {
        chat_base_url: Some(server.uri()),
        ..Default::default()
    })
    .await;

    let response = app
        .client
        .post(app.url("/api/chat"))
        .json(&json!({ "message": "What is the average price of books?" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Cannot connect to the chatbot service");
}

#[tokio::test]
async fn test_status_reports_online_and_offline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;
    let online = TestApp::spawn_lazy(TestAppOptions {
        chat_base_url: Some(server.uri()),
        ..Default::default()
    })
    .await;
    let offline = TestApp::spawn_lazy(TestAppOptions::default()).await;

    let body: Value = online
        .client
        .get(online.url("/api/chat/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "online");

    let response = offline
        .client
        .get(offline.url("/api/chat/status"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "offline");
}
