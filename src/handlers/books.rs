use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    error::Result,
    extract::{JsonBody, PathParam, QueryParams},
    models::books::{BookListQuery, BookPage, CreateBookRequest, UpdateBook},
    services::books,
    state::AppState,
};

/// POST /api/books
///
/// # HTTP Status Codes
/// - `201 CREATED`: Book listed
/// - `400 BAD_REQUEST`: Missing title, author, price or owner_id, or invalid price
/// - `404 NOT_FOUND`: Owner or category does not exist
pub async fn create_book(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateBookRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let mut conn = state.pool.acquire().await?;
    let book = books::create_book(&mut conn, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Book created successfully",
            "book": book
        })),
    ))
}

/// GET /api/books
///
/// # Query Parameters
/// - `status`, `category_id`, `owner_id`: exact match
/// - `author`, `title`: case-insensitive substring
/// - `page` (default 1), `limit` (default 12, max 100)
pub async fn list_books(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<BookListQuery>,
) -> Result<Json<BookPage>> {
    let page = books::list_books(&state.pool, query).await?;
    Ok(Json(page))
}

/// GET /api/books/{id}
pub async fn get_book(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    let book = books::get_book(&mut conn, id).await?;

    Ok(Json(serde_json::json!({
        "book": book
    })))
}

/// PUT /api/books/{id}
pub async fn update_book(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(update): JsonBody<UpdateBook>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    let book = books::update_book(&mut conn, id, update).await?;

    Ok(Json(serde_json::json!({
        "message": "Book updated successfully",
        "book": book
    })))
}

/// DELETE /api/books/{id}
///
/// # HTTP Status Codes
/// - `400 BAD_REQUEST`: The book is currently rented
pub async fn delete_book(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    books::delete_book(&mut conn, id).await?;

    Ok(Json(serde_json::json!({
        "message": "Book deleted successfully"
    })))
}
