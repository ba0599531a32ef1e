use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    error::Result,
    extract::{JsonBody, PathParam},
    models::categories::CategoryRequest,
    services::categories,
    state::AppState,
};

/// POST /api/categories
pub async fn create_category(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CategoryRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let mut conn = state.pool.acquire().await?;
    let category = categories::create_category(&mut conn, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Category created successfully",
            "category": category
        })),
    ))
}

/// GET /api/categories
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    let categories = categories::list_categories(&mut conn).await?;

    Ok(Json(serde_json::json!({
        "categories": categories
    })))
}

/// GET /api/categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    let category = categories::get_category(&mut conn, id).await?;

    Ok(Json(serde_json::json!({
        "category": category
    })))
}

/// PUT /api/categories/{id}
pub async fn update_category(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(request): JsonBody<CategoryRequest>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    let category = categories::update_category(&mut conn, id, request).await?;

    Ok(Json(serde_json::json!({
        "message": "Category updated successfully",
        "category": category
    })))
}

/// DELETE /api/categories/{id}
///
/// Books of the category are kept, without a category.
pub async fn delete_category(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    categories::delete_category(&mut conn, id).await?;

    Ok(Json(serde_json::json!({
        "message": "Category deleted successfully"
    })))
}
