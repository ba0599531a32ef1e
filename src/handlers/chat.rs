use axum::{Json, extract::State};

use crate::{
    error::Result,
    extract::JsonBody,
    models::chat::{ChatRequest, ChatResponse, ChatStatus},
    state::AppState,
};

/// POST /api/chat
///
/// # HTTP Status Codes
/// - `200 OK`: Answer from the model, or the refusal for off-topic questions
/// - `400 BAD_REQUEST`: Empty message
/// - `500 INTERNAL_SERVER_ERROR`: The chat completion endpoint failed
pub async fn chat(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let response = state.chat.reply(&state.pool, request).await?;
    Ok(Json(response))
}

/// GET /api/chat/status
///
/// Always 200; `status` tells whether the model endpoint answers.
pub async fn chat_status(State(state): State<AppState>) -> Json<ChatStatus> {
    Json(state.chat.status().await)
}
