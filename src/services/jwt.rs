use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message returned when a protected route is called without credentials.
pub const TOKEN_REQUIRED: &str = "Access token required";

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id
    pub id: Uuid,
    pub email: String,
    /// Issued at time as Unix timestamp
    pub iat: i64,
    /// Expiration time as Unix timestamp
    pub exp: i64,
}

/// Generates an HS256 access token for a user
///
/// # Returns
/// The token string and its expiry instant
///
/// # Example
/// ```rust,no_run
/// use bookineo::services::jwt::generate_jwt;
/// use uuid::Uuid;
///
/// let (token, _expires_at) = generate_jwt(Uuid::now_v7(), "reader@example.com", "my-secret", 15)?;
/// # Ok::<(), bookineo::error::Error>(())
/// ```
pub fn generate_jwt(
    user_id: Uuid,
    email: &str,
    secret: &str,
    expiration_minutes: i64,
) -> Result<(String, DateTime<Utc>)> {
    let now = Utc::now();
    let expiration = now + Duration::minutes(expiration_minutes);

    let claims = Claims {
        id: user_id,
        email: email.to_string(),
        iat: now.timestamp(),
        exp: expiration.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| Error::Internal(format!("Failed to generate JWT: {}", e)))?;

    Ok((token, expiration))
}

/// Verifies a JWT token and returns the claims if valid
///
/// # Errors
/// `Error::InvalidToken` if the token is malformed, expired, or has a bad signature
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::ExpiredSignature => Error::InvalidToken("Token has expired".to_string()),
            ErrorKind::InvalidSignature => Error::InvalidToken("Invalid token signature".to_string()),
            _ => Error::InvalidToken("Invalid token".to_string()),
        }
    })?;

    Ok(token_data.claims)
}

/// Validates JWT from an Authorization header value
/// Format: "Authorization: Bearer <token>"
pub fn authenticate_jwt_token(auth_header: Option<&str>, secret: &str) -> Result<Claims> {
    let token = extract_token_from_header(auth_header)?;
    verify_jwt(token, secret)
}

/// Extracts the Bearer token from the Authorization header
pub fn extract_token_from_header(auth_header: Option<&str>) -> Result<&str> {
    match auth_header {
        None => Err(Error::Authentication(TOKEN_REQUIRED.to_string())),
        Some(header) => match header.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(token.trim()),
            Some(_) => Err(Error::Authentication(TOKEN_REQUIRED.to_string())),
            None => Err(Error::InvalidToken(
                "Invalid Authorization header format. Expected: 'Bearer <token>'".to_string(),
            )),
        },
    }
}
