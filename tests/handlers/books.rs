use crate::common::{TestApp, create_book, create_category, register_and_login, rent};
use serde_json::{Value, json};
use uuid::Uuid;

#[tokio::test]
async fn test_create_book_returns_201_with_available_status() {
    let app = TestApp::spawn().await;
    let owner = register_and_login(&app, "bookowner").await;

    let response = app
        .client
        .post(app.url("/api/books"))
        .json(&json!({
            "title": "Le Petit Prince",
            "author": "Antoine de Saint-Exupéry",
            "price": 2.99,
            "owner_id": owner.id,
            "publication_year": 1943
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["book"]["status"], "available");
    assert_eq!(body["book"]["price"], 2.99);
    assert_eq!(body["book"]["owner_id"], owner.id.to_string());
}

#[tokio::test]
async fn test_create_book_missing_fields_returns_400() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/books"))
        .json(&json!({ "title": "Untitled" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["fields"]["author"].is_string());
    assert!(body["fields"]["price"].is_string());
    assert!(body["fields"]["owner_id"].is_string());
}

#[tokio::test]
async fn test_create_book_negative_price_returns_400() {
    let app = TestApp::spawn().await;
    let owner = register_and_login(&app, "negprice").await;

    let response = app
        .client
        .post(app.url("/api/books"))
        .json(&json!({
            "title": "Cheap",
            "author": "Someone",
            "price": -1.0,
            "owner_id": owner.id
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_create_book_over_column_limits_returns_400_naming_field() {
    let app = TestApp::spawn().await;
    let owner = register_and_login(&app, "limits").await;

    let cases = [
        (json!({ "title": "t".repeat(256), "author": "A", "price": 1.0 }), "title"),
        (json!({ "title": "T", "author": "a".repeat(256), "price": 1.0 }), "author"),
        (json!({ "title": "T", "author": "A", "price": 1e9 }), "price"),
    ];
    for (mut book, field) in cases {
        book["owner_id"] = json!(owner.id);
        let response = app
            .client
            .post(app.url("/api/books"))
            .json(&book)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 400, "field {field}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["fields"][field].is_string(), "field {field}: {body}");
    }
}

#[tokio::test]
async fn test_create_book_for_unknown_owner_returns_404() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/books"))
        .json(&json!({
            "title": "Orphan",
            "author": "Someone",
            "price": 1.0,
            "owner_id": Uuid::new_v4()
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_list_books_paginates_by_owner() {
    let app = TestApp::spawn().await;
    let owner = register_and_login(&app, "paging").await;
    for i in 0..13 {
        create_book(&app, owner.id, &format!("Paging Volume {i}")).await;
    }

    let response = app
        .client
        .get(app.url(&format!("/api/books?owner_id={}&page=2&limit=12", owner.id)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["books"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["currentPage"], 2);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["pagination"]["totalBooks"], 13);
    assert_eq!(body["pagination"]["hasNextPage"], false);
    assert_eq!(body["pagination"]["hasPreviousPage"], true);
}

#[tokio::test]
async fn test_list_books_with_huge_page_returns_empty_page() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/api/books?page=9223372036854775807&limit=12"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["books"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["hasNextPage"], false);
}

#[tokio::test]
async fn test_list_books_filters_title_case_insensitively() {
    let app = TestApp::spawn().await;
    let owner = register_and_login(&app, "titlefilter").await;
    let marker = nanoid::nanoid!(10, &nanoid::alphabet::SAFE).to_lowercase();
    create_book(&app, owner.id, &format!("The {marker} Chronicles")).await;
    create_book(&app, owner.id, "Something else entirely").await;

    let response = app
        .client
        .get(app.url(&format!("/api/books?title={}", marker.to_uppercase())))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let books = body["books"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], format!("The {marker} Chronicles"));
    assert_eq!(books[0]["owner_last_name"], "titlefilter");
}

#[tokio::test]
async fn test_get_unknown_book_returns_404() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url(&format!("/api/books/{}", Uuid::new_v4())))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_get_book_includes_category_name() {
    let app = TestApp::spawn().await;
    let owner = register_and_login(&app, "withcat").await;
    let category_id = create_category(&app, "Science Fiction").await;
    let book_id = create_book(&app, owner.id, "Dune").await;

    let response = app
        .client
        .put(app.url(&format!("/api/books/{book_id}")))
        .json(&json!({ "category_id": category_id }))
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
    assert_eq!(body["book"]["category_name"], "Science Fiction");
}

#[tokio::test]
async fn test_update_book_is_partial() {
    let app = TestApp::spawn().await;
    let owner = register_and_login(&app, "partial").await;
    let book_id = create_book(&app, owner.id, "First Edition").await;

    let response = app
        .client
        .put(app.url(&format!("/api/books/{book_id}")))
        .json(&json!({ "price": 7.25 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["book"]["price"], 7.25);
    assert_eq!(body["book"]["title"], "First Edition");
    assert_eq!(body["book"]["author"], "Test Author");
}

#[tokio::test]
async fn test_delete_rented_book_returns_400() {
    let app = TestApp::spawn().await;
    let owner = register_and_login(&app, "delbook").await;
    let renter = register_and_login(&app, "delbookrenter").await;
    let book_id = create_book(&app, owner.id, "Out on Loan").await;
    assert_eq!(rent(&app, book_id, renter.id).await.status(), 201);

    let response = app
        .client
        .delete(app.url(&format!("/api/books/{book_id}")))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Cannot delete a book that is currently rented");
}

#[tokio::test]
async fn test_delete_available_book() {
    let app = TestApp::spawn().await;
    let owner = register_and_login(&app, "delok").await;
    let book_id = create_book(&app, owner.id, "Short Lived").await;

    let response = app
        .client
        .delete(app.url(&format!("/api/books/{book_id}")))
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
    assert_eq!(response.status(), 404);
}
