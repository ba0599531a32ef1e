use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    error::Result,
    extract::{JsonBody, PathParam},
    middleware::auth::AuthenticatedUser,
    models::messages::{SendMessageRequest, UnreadCount},
    services::messages,
    state::AppState,
};

/// POST /api/messages
///
/// Sends a message to a user given by `recipient_id` or `recipient_email`.
/// The recipient is notified by email and on their live connections.
///
/// # HTTP Status Codes
/// - `201 CREATED`: Message stored
/// - `400 BAD_REQUEST`: Missing content or recipient, or message to self
/// - `403 FORBIDDEN`: `sender_id` is not the caller
/// - `404 NOT_FOUND`: Recipient does not exist
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    JsonBody(request): JsonBody<SendMessageRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let mut conn = state.pool.acquire().await?;
    let message = messages::send_message(
        &mut conn,
        &state.notifier,
        &state.email,
        auth_user.id,
        request,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": message
        })),
    ))
}

/// GET /api/messages/user/{user_id}
///
/// Messages sent and received by the caller, newest first.
pub async fn list_user_messages(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    PathParam(user_id): PathParam<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    let messages = messages::list_messages(&mut conn, auth_user.id, user_id).await?;

    Ok(Json(serde_json::json!({
        "messages": messages
    })))
}

/// GET /api/messages/user/{user_id}/unread/count
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    PathParam(user_id): PathParam<Uuid>,
) -> Result<Json<UnreadCount>> {
    let mut conn = state.pool.acquire().await?;
    let count = messages::unread_count(&mut conn, auth_user.id, user_id).await?;
    Ok(Json(count))
}

/// GET /api/messages/{id}
///
/// Opening an unread message as its recipient marks it read.
pub async fn get_message(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    let message = messages::get_message(&mut conn, &state.notifier, auth_user.id, id).await?;

    Ok(Json(serde_json::json!({
        "message": message
    })))
}

/// PATCH|PUT /api/messages/{id}/read
pub async fn mark_as_read(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    let message = messages::mark_as_read(&mut conn, &state.notifier, auth_user.id, id).await?;

    Ok(Json(serde_json::json!({
        "message": message
    })))
}

/// DELETE /api/messages/{id}
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    messages::delete_message(&mut conn, auth_user.id, id).await?;

    Ok(Json(serde_json::json!({
        "deleted": true,
        "id": id
    })))
}
