use crate::common::{TestApp, register_and_login};
use serde_json::json;
use std::time::Duration;

/// Reads the stream until `needle` shows up or the timeout expires.
async fn read_until(response: &mut reqwest::Response, buffer: &mut String, needle: &str) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !buffer.contains(needle) {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match tokio::time::timeout(remaining, response.chunk()).await {
            Ok(Ok(Some(chunk))) => buffer.push_str(&String::from_utf8_lossy(&chunk)),
            _ => return false,
        }
    }
    true
}

#[tokio::test]
async fn test_stream_delivers_new_message_and_read_events() {
    let app = TestApp::spawn().await;
    let alice = register_and_login(&app, "streamer").await;
    let bob = register_and_login(&app, "streamerbob").await;

    let mut bob_stream = app
        .client
        .get(app.url(&format!("/api/notifications/stream?token={}", bob.token)))
        .send()
        .await
        .unwrap();
    assert_eq!(bob_stream.status(), 200);
    assert!(
        bob_stream.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    let mut bob_events = String::new();
    assert!(read_until(&mut bob_stream, &mut bob_events, "event: connected").await);

    let mut alice_stream = app
        .client
        .get(app.url("/api/notifications/stream"))
        .header("Authorization", alice.bearer())
        .send()
        .await
        .unwrap();
    let mut alice_events = String::new();
    assert!(read_until(&mut alice_stream, &mut alice_events, "event: connected").await);
    assert!(app.state.notifier.is_online(alice.id));

    let response = app
        .client
        .post(app.url("/api/messages"))
        .header("Authorization", alice.bearer())
        .json(&json!({ "recipient_id": bob.id, "content": "Ping over SSE" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let message: serde_json::Value = response.json().await.unwrap();
    let id = message["message"]["id"].as_str().unwrap().to_string();

    assert!(read_until(&mut bob_stream, &mut bob_events, "event: newMessage").await);
    assert!(bob_events.contains("Ping over SSE"));

    let response = app
        .client
        .patch(app.url(&format!("/api/messages/{id}/read")))
        .header("Authorization", bob.bearer())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    assert!(read_until(&mut alice_stream, &mut alice_events, "event: messageRead").await);
    assert!(alice_events.contains(&id));
}

#[tokio::test]
async fn test_stream_rejects_bad_query_token() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/api/notifications/stream?token=garbage"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
}
