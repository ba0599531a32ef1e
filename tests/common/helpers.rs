use super::TestApp;
use serde_json::{Value, json};
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "password123";

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Unique email so tests can run in parallel against one database
pub fn generate_test_email(prefix: &str) -> String {
    format!(
        "test_{}_{}@example.com",
        prefix,
        nanoid::nanoid!(12, &nanoid::alphabet::SAFE).to_lowercase()
    )
}

/// Registers a fresh user and logs in.
pub async fn register_and_login(app: &TestApp, prefix: &str) -> TestUser {
    let email = generate_test_email(prefix);

    let response = app
        .client
        .post(app.url("/api/users/register"))
        .json(&json!({
            "email": email,
            "password": TEST_PASSWORD,
            "first_name": "Test",
            "last_name": prefix
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    let id = Uuid::parse_str(body["user"]["id"].as_str().unwrap()).unwrap();

    let response = app
        .client
        .post(app.url("/api/users/login"))
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    TestUser { id, email, token }
}

pub async fn create_category(app: &TestApp, name: &str) -> Uuid {
    let response = app
        .client
        .post(app.url("/api/categories"))
        .json(&json!({ "name": name }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    Uuid::parse_str(body["category"]["id"].as_str().unwrap()).unwrap()
}

pub async fn create_book(app: &TestApp, owner_id: Uuid, title: &str) -> Uuid {
    let response = app
        .client
        .post(app.url("/api/books"))
        .json(&json!({
            "title": title,
            "author": "Test Author",
            "price": 3.5,
            "owner_id": owner_id,
            "publication_year": 1999
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    Uuid::parse_str(body["book"]["id"].as_str().unwrap()).unwrap()
}

/// POST /api/rentals/rent with fixed dates
pub async fn rent(app: &TestApp, book_id: Uuid, renter_id: Uuid) -> reqwest::Response {
    app.client
        .post(app.url("/api/rentals/rent"))
        .json(&json!({
            "book_id": book_id,
            "renter_id": renter_id,
            "rental_date": "2025-03-01",
            "expected_return_date": "2025-03-15"
        }))
        .send()
        .await
        .unwrap()
}
