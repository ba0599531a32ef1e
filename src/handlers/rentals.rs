use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::Result,
    extract::{JsonBody, PathParam, QueryParams},
    models::rentals::{RentBookRequest, RentalStatus, ReturnBookRequest},
    services::rentals,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RentalListQuery {
    pub status: Option<RentalStatus>,
}

/// POST /api/rentals/rent
///
/// # HTTP Status Codes
/// - `201 CREATED`: Rental created and book marked rented
/// - `400 BAD_REQUEST`: Missing fields, bad dates, own book, or book not available
/// - `404 NOT_FOUND`: Book or renter does not exist
pub async fn rent_book(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RentBookRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let mut conn = state.pool.acquire().await?;
    let transition = rentals::rent_book(&mut conn, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Book rented successfully",
            "rental": transition.rental,
            "book": transition.book
        })),
    ))
}

/// POST /api/rentals/return
///
/// # HTTP Status Codes
/// - `200 OK`: Rental closed and book available again
/// - `400 BAD_REQUEST`: Missing fields or rental already returned
/// - `404 NOT_FOUND`: Rental does not exist
pub async fn return_book(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ReturnBookRequest>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    let transition = rentals::return_book(&mut conn, request).await?;

    Ok(Json(serde_json::json!({
        "message": "Book returned successfully",
        "rental": transition.rental,
        "book": transition.book
    })))
}

/// GET /api/rentals
pub async fn list_rentals(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<RentalListQuery>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    let rentals = rentals::list_rentals(&mut conn, query.status).await?;

    Ok(Json(serde_json::json!({
        "rentals": rentals
    })))
}

/// GET /api/rentals/user/{id}
pub async fn list_user_rentals(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    let rentals = rentals::list_user_rentals(&mut conn, user_id).await?;

    Ok(Json(serde_json::json!({
        "rentals": rentals
    })))
}
