use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use crate::{
    error::Result,
    extract::JsonBody,
    middleware::auth::AuthenticatedUser,
    models::users::{
        ForgotPasswordRequest, LoginUser, RegisterUser, ResetPasswordRequest, UpdateProfileRequest,
    },
    services::users,
    state::AppState,
};

/// Answer to every forgot-password request, whether or not the account exists.
const RESET_REQUESTED: &str = "If an account exists for this email, a reset link has been sent";

/// POST /api/users/register
///
/// Registers a new user and sends a welcome email in the background.
///
/// # HTTP Status Codes
/// - `201 CREATED`: User registered successfully
/// - `400 BAD_REQUEST`: Missing fields, invalid email, short password or email already taken
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterUser>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let mut conn = state.pool.acquire().await?;
    let user = users::register_user(&mut conn, request).await?;

    let email = state.email.clone();
    let to = user.email.clone();
    let first_name = user.first_name.clone();
    tokio::spawn(async move {
        if let Err(e) = email.send_welcome_email(&to, first_name.as_deref()).await {
            tracing::warn!(error = %e, "Failed to send welcome email");
        }
    });

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "User created successfully",
            "user": user
        })),
    ))
}

/// POST /api/users/login
///
/// # Returns
/// - `token`: JWT access token
/// - `user`: User object
/// - `expires_at`: ISO 8601 timestamp of token expiration
///
/// # HTTP Status Codes
/// - `200 OK`: Authentication successful
/// - `400 BAD_REQUEST`: Missing fields, or incorrect email or password
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginUser>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    let result = users::login_user(&mut conn, request, &state.config.jwt).await?;

    Ok(Json(serde_json::json!({
        "message": "Login successful",
        "token": result.token,
        "user": result.user,
        "expires_at": result.expires_at
    })))
}

/// GET /api/users/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    let user = users::get_profile(&mut conn, auth_user.id).await?;

    Ok(Json(serde_json::json!({
        "user": user
    })))
}

/// PUT /api/users/profile
///
/// Partial update of the caller's profile. Absent fields are left unchanged.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    JsonBody(request): JsonBody<UpdateProfileRequest>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    let user = users::update_profile(&mut conn, auth_user.id, request).await?;

    Ok(Json(serde_json::json!({
        "message": "Profile updated successfully",
        "user": user
    })))
}

/// DELETE /api/users
///
/// # HTTP Status Codes
/// - `200 OK`: Account and owned data deleted
/// - `409 CONFLICT`: The account takes part in an active rental
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    users::delete_account(&mut conn, auth_user.id).await?;

    Ok(Json(serde_json::json!({
        "message": "Account deleted successfully"
    })))
}

/// POST /api/users/forgot-password
///
/// Always answers 200 with the same message so account existence is not revealed.
pub async fn forgot_password(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ForgotPasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    let issued =
        users::request_password_reset(&mut conn, request.email, &state.config.password_reset).await?;

    if let Some((user, token)) = issued {
        let email = state.email.clone();
        tokio::spawn(async move {
            if let Err(e) = email.send_password_reset_email(&user.email, &token).await {
                tracing::warn!(error = %e, user_id = %user.id, "Failed to send password reset email");
            }
        });
    }

    Ok(Json(serde_json::json!({
        "message": RESET_REQUESTED
    })))
}

/// POST /api/users/reset-password
///
/// # HTTP Status Codes
/// - `200 OK`: Password changed
/// - `400 BAD_REQUEST`: Unknown, used or expired token, or invalid password
pub async fn reset_password(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await?;
    users::reset_password(&mut conn, request).await?;

    Ok(Json(serde_json::json!({
        "message": "Password has been reset successfully"
    })))
}
