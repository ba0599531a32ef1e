//! JWT authentication middleware
//!
//! Validates bearer tokens and adds the authenticated user to request
//! extensions for handler access.

use axum::{
    extract::{Query, Request, State},
    http::{HeaderMap, Uri},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    models::users::User,
    queries,
    services::jwt::{authenticate_jwt_token, verify_jwt},
    state::AppState,
};

use secrecy::ExposeSecret;

/// Authenticated user extracted from JWT token
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    /// User's unique identifier
    pub id: Uuid,
    /// User's email address
    pub email: String,
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Loads the account behind a verified token. Tokens of deleted accounts are rejected.
async fn resolve_user(state: &AppState, user_id: Uuid) -> Result<AuthenticatedUser> {
    let mut conn = state.pool.acquire().await?;
    let user = queries::users::get_user_by_id(&mut conn, user_id)
        .await?
        .ok_or_else(|| Error::InvalidToken("User no longer exists".to_string()))?;
    Ok(user.into())
}

/// JWT authentication middleware
///
/// # Behavior
/// 1. Extracts the token from `Authorization: Bearer <token>`
/// 2. Validates signature and expiration
/// 3. Adds `AuthenticatedUser` to request extensions
/// 4. Missing token answers 401, an invalid or expired one 403
///
/// # Usage
/// Apply this middleware to protected routes using `route_layer()`:
///
/// ```ignore
/// Router::new()
///     .route("/protected", get(protected_handler))
///     .route_layer(middleware::from_fn_with_state(
///         state.clone(),
///         jwt_auth_middleware,
///     ))
/// ```
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let auth_header = headers.get("authorization").and_then(|h| h.to_str().ok());
    let claims = authenticate_jwt_token(auth_header, state.config.jwt.secret.expose_secret())?;

    let user = resolve_user(&state, claims.id).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Authentication for the notification stream.
///
/// Same as [`jwt_auth_middleware`], but also accepts `?token=<jwt>` because
/// browser `EventSource` clients cannot set headers.
pub async fn stream_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let secret = state.config.jwt.secret.expose_secret();
    let auth_header = headers.get("authorization").and_then(|h| h.to_str().ok());

    let claims = match (auth_header, token_from_uri(request.uri())?) {
        (None, Some(token)) => verify_jwt(&token, secret)?,
        (auth_header, _) => authenticate_jwt_token(auth_header, secret)?,
    };

    let user = resolve_user(&state, claims.id).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[derive(Debug, Deserialize)]
struct StreamTokenQuery {
    token: Option<String>,
}

/// The `token` query parameter, percent-decoded. Blank counts as absent.
fn token_from_uri(uri: &Uri) -> Result<Option<String>> {
    let Query(query) = Query::<StreamTokenQuery>::try_from_uri(uri)?;
    Ok(query.token.filter(|token| !token.is_empty()))
}
