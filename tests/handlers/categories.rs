use crate::common::{TestApp, create_book, create_category, register_and_login};
use serde_json::{Value, json};
use uuid::Uuid;

#[tokio::test]
async fn test_create_and_list_categories() {
    let app = TestApp::spawn().await;
    let name = format!("Poetry {}", nanoid::nanoid!(6));
    let id = create_category(&app, &name).await;

    let response = app.client.get(app.url("/api/categories")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let listed = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c["id"] == id.to_string() && c["name"] == name);
    assert!(listed);
}

#[tokio::test]
async fn test_create_category_without_name_returns_400() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/categories"))
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_create_category_with_too_long_name_returns_400() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/categories"))
        .json(&json!({ "name": "n".repeat(150) }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["fields"]["name"].is_string());
}

#[tokio::test]
async fn test_update_and_get_category() {
    let app = TestApp::spawn().await;
    let id = create_category(&app, "Thriler").await;

    let response = app
        .client
        .put(app.url(&format!("/api/categories/{id}")))
        .json(&json!({ "name": "Thriller" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = app
        .client
        .get(app.url(&format!("/api/categories/{id}")))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["category"]["name"], "Thriller");
}

#[tokio::test]
async fn test_unknown_category_returns_404() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .delete(app.url(&format!("/api/categories/{}", Uuid::new_v4())))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_deleting_category_keeps_its_books() {
    let app = TestApp::spawn().await;
    let owner = register_and_login(&app, "catdel").await;
    let category_id = create_category(&app, "Doomed").await;
    let book_id = create_book(&app, owner.id, "Survivor").await;
    app.client
        .put(app.url(&format!("/api/books/{book_id}")))
        .json(&json!({ "category_id": category_id }))
        .send()
        .await
        .unwrap();

    let response = app
        .client
        .delete(app.url(&format!("/api/categories/{category_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = app
        .client
        .get(app.url(&format!("/api/books/{book_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["book"]["category_id"].is_null());
}
