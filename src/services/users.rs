use crate::DbConn;
use crate::{
    config::{JwtConfig, PasswordResetConfig},
    error::{Error, Result},
    models::users::{
        LoginResult, LoginUser, NewPasswordResetToken, NewUser, RegisterUser,
        ResetPasswordRequest, UpdateProfileRequest, UpdateUser, User,
    },
    queries::{password_resets, users},
    services::jwt::generate_jwt,
    validation::{
        MAX_NAME_LENGTH, collect_missing, sanitize_optional, validate_email, validate_length,
        validate_password,
    },
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::Rng;
use secrecy::ExposeSecret;
use sqlx::Connection;
use uuid::Uuid;

/// Same message for an unknown email and a wrong password.
pub const INVALID_CREDENTIALS: &str = "Incorrect email or password";

/// Hashes a password with Argon2 and a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?
        .to_string();
    Ok(password_hash)
}

/// Verifies a password against a password hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| Error::Internal(format!("Invalid password hash: {}", e)))?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(Error::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

fn sanitize_name(field: &str, value: Option<String>) -> Result<Option<String>> {
    let value = sanitize_optional(value);
    if let Some(name) = &value {
        validate_length(field, name, MAX_NAME_LENGTH)?;
    }
    Ok(value)
}

/// Registers a new user with password validation and hashing
pub async fn register_user(conn: &mut DbConn, register_user: RegisterUser) -> Result<User> {
    let email = sanitize_optional(register_user.email);
    let password = register_user.password.filter(|p| !p.is_empty());

    let missing = collect_missing([("email", email.is_none()), ("password", password.is_none())]);
    let (Some(email), Some(password)) = (email, password) else {
        return Err(Error::missing_fields(&missing));
    };

    validate_email(&email)?;
    validate_password(&password)?;
    let first_name = sanitize_name("first_name", register_user.first_name)?;
    let last_name = sanitize_name("last_name", register_user.last_name)?;

    let new_user = NewUser {
        email: email.to_lowercase(),
        password_hash: hash_password(&password)?,
        first_name,
        last_name,
        birth_date: register_user.birth_date,
    };

    let user = users::create_user(conn, new_user).await?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok(user)
}

/// Checks credentials and issues an access token.
pub async fn login_user(conn: &mut DbConn, login_user: LoginUser, jwt: &JwtConfig) -> Result<LoginResult> {
    let email = sanitize_optional(login_user.email);
    let password = login_user.password.filter(|p| !p.is_empty());

    let missing = collect_missing([("email", email.is_none()), ("password", password.is_none())]);
    let (Some(email), Some(password)) = (email, password) else {
        return Err(Error::missing_fields(&missing));
    };

    let user = users::get_user_by_email(conn, &email)
        .await?
        .ok_or_else(|| Error::BadRequest(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(&password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(Error::BadRequest(INVALID_CREDENTIALS.to_string()));
    }

    let (token, expires_at) = generate_jwt(
        user.id,
        &user.email,
        jwt.secret.expose_secret(),
        jwt.expiration_minutes,
    )?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(LoginResult {
        token,
        user,
        expires_at,
    })
}

pub async fn get_profile(conn: &mut DbConn, user_id: Uuid) -> Result<User> {
    users::get_user_by_id(conn, user_id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))
}

/// Applies a partial profile update. Blank fields are ignored.
pub async fn update_profile(conn: &mut DbConn, user_id: Uuid, request: UpdateProfileRequest) -> Result<User> {
    let email = sanitize_optional(request.email);
    if let Some(email) = &email {
        validate_email(email)?;
    }
    let first_name = sanitize_name("first_name", request.first_name)?;
    let last_name = sanitize_name("last_name", request.last_name)?;

    let password_hash = match request.password.filter(|p| !p.is_empty()) {
        Some(password) => {
            validate_password(&password)?;
            Some(hash_password(&password)?)
        }
        None => None,
    };

    let update = UpdateUser {
        email: email.map(|e| e.to_lowercase()),
        password_hash,
        first_name,
        last_name,
        birth_date: request.birth_date,
    };

    let user = users::update_user(conn, user_id, update)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(user)
}

/// Deletes an account unless it still takes part in an active rental.
pub async fn delete_account(conn: &mut DbConn, user_id: Uuid) -> Result<()> {
    let mut tx = conn.begin().await?;

    if !users::lock_user_for_deletion(&mut tx, user_id).await? {
        return Err(Error::NotFound("User not found".to_string()));
    }

    let blocking = users::count_blocking_rentals(&mut tx, user_id).await?;
    if blocking > 0 {
        return Err(Error::Conflict(
            "Cannot delete an account involved in an active rental".to_string(),
        ));
    }

    if users::delete_user(&mut tx, user_id).await? == 0 {
        return Err(Error::NotFound("User not found".to_string()));
    }

    tx.commit().await?;
    tracing::info!(user_id = %user_id, "Account deleted");
    Ok(())
}

/// 256 random bits, hex encoded.
pub fn generate_reset_token() -> String {
    let mut rng = rand::rng();
    let mut random_bytes = [0u8; 32];
    rng.fill(&mut random_bytes);
    hex::encode(random_bytes)
}

/// Creates a reset token for the account with this email, if there is one.
/// Returns the user and the plain token to email; only its hash is stored.
pub async fn request_password_reset(
    conn: &mut DbConn,
    email: Option<String>,
    config: &PasswordResetConfig,
) -> Result<Option<(User, String)>> {
    let email = sanitize_optional(email).ok_or_else(|| Error::missing_fields(&["email"]))?;

    let Some(user) = users::get_user_by_email(conn, &email).await? else {
        tracing::debug!("Password reset requested for an unknown email");
        return Ok(None);
    };

    let token = generate_reset_token();
    let new_token = NewPasswordResetToken {
        user_id: user.id,
        token_hash: password_resets::hash_reset_token(&token),
        expires_at: Utc::now() + Duration::minutes(config.token_ttl_minutes),
    };
    password_resets::create_reset_token(conn, new_token).await?;

    tracing::info!(user_id = %user.id, "Password reset token issued");
    Ok(Some((user, token)))
}

/// Consumes a reset token and sets the new password.
pub async fn reset_password(conn: &mut DbConn, request: ResetPasswordRequest) -> Result<()> {
    let token = sanitize_optional(request.token);
    let password = request.password.filter(|p| !p.is_empty());

    let missing = collect_missing([("token", token.is_none()), ("password", password.is_none())]);
    let (Some(token), Some(password)) = (token, password) else {
        return Err(Error::missing_fields(&missing));
    };
    validate_password(&password)?;

    let password_hash = hash_password(&password)?;
    let mut tx = conn.begin().await?;

    let reset = password_resets::consume_reset_token(&mut tx, &password_resets::hash_reset_token(&token))
        .await?
        .ok_or_else(|| Error::BadRequest("Invalid or expired reset token".to_string()))?;

    users::update_user_password(&mut tx, reset.user_id, &password_hash).await?;
    password_resets::invalidate_user_tokens(&mut tx, reset.user_id).await?;

    tx.commit().await?;
    tracing::info!(user_id = %reset.user_id, "Password reset completed");
    Ok(())
}
