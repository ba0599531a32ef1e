use crate::{
    error::{Error, Result},
    models::users::{NewPasswordResetToken, PasswordResetToken},
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::DbConn;

/// Hash a reset token using SHA-256 for secure storage
pub fn hash_reset_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

/// Stores a new reset token hash.
pub async fn create_reset_token(conn: &mut DbConn, new_token: NewPasswordResetToken) -> Result<PasswordResetToken> {
    let token = sqlx::query_as::<_, PasswordResetToken>(
        r#"
        INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, token_hash, expires_at, used_at, created_at
        "#,
    )
    .bind(new_token.user_id)
    .bind(&new_token.token_hash)
    .bind(new_token.expires_at)
    .fetch_one(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(token)
}

/// Consumes a token: marks it used if it exists, is unused and has not expired.
/// Returns `None` otherwise.
pub async fn consume_reset_token(conn: &mut DbConn, token_hash: &str) -> Result<Option<PasswordResetToken>> {
    let token = sqlx::query_as::<_, PasswordResetToken>(
        r#"
        UPDATE password_reset_tokens
        SET used_at = now()
        WHERE token_hash = $1 AND used_at IS NULL AND expires_at > now()
        RETURNING id, user_id, token_hash, expires_at, used_at, created_at
        "#,
    )
    .bind(token_hash)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(token)
}

/// Invalidates every outstanding token of a user.
pub async fn invalidate_user_tokens(conn: &mut DbConn, user_id: Uuid) -> Result<u64> {
    let rows_affected = sqlx::query(
        "UPDATE password_reset_tokens SET used_at = now() WHERE user_id = $1 AND used_at IS NULL",
    )
    .bind(user_id)
    .execute(conn)
    .await
    .map_err(Error::Sqlx)?
    .rows_affected();

    Ok(rows_affected)
}

/// Deletes expired or already used tokens.
pub async fn delete_stale_reset_tokens(conn: &mut DbConn) -> Result<u64> {
    let rows_affected = sqlx::query(
        "DELETE FROM password_reset_tokens WHERE expires_at <= now() OR used_at IS NOT NULL",
    )
    .execute(conn)
    .await
    .map_err(Error::Sqlx)?
    .rows_affected();

    Ok(rows_affected)
}
