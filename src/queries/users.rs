use crate::{
    error::{Error, Result},
    models::users::{NewUser, UpdateUser, User},
};
use uuid::Uuid;

use crate::DbConn;

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, birth_date, created_at, updated_at";

/// True when the database error is a violation of the unique email constraint.
fn is_duplicate_email(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

fn duplicate_email_error() -> Error {
    Error::validation("email", "An account with this email already exists")
}

/// Creates a new user in the database.
pub async fn create_user(conn: &mut DbConn, new_user: NewUser) -> Result<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name, birth_date)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(new_user.birth_date)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if is_duplicate_email(&e) {
            duplicate_email_error()
        } else {
            Error::Sqlx(e)
        }
    })?;

    Ok(user)
}

/// Gets a single user by their ID. The user may not exist.
pub async fn get_user_by_id(conn: &mut DbConn, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(user)
}

/// Gets a single user by their email address (case-insensitive). The user may not exist.
pub async fn get_user_by_email(conn: &mut DbConn, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
    ))
    .bind(email)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(user)
}

/// Updates the given columns of a user; `None` fields keep their value.
pub async fn update_user(conn: &mut DbConn, id: Uuid, update: UpdateUser) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET email = COALESCE($1, email),
            password_hash = COALESCE($2, password_hash),
            first_name = COALESCE($3, first_name),
            last_name = COALESCE($4, last_name),
            birth_date = COALESCE($5, birth_date),
            updated_at = now()
        WHERE id = $6
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(update.email)
    .bind(update.password_hash)
    .bind(update.first_name)
    .bind(update.last_name)
    .bind(update.birth_date)
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(|e| {
        if is_duplicate_email(&e) {
            duplicate_email_error()
        } else {
            Error::Sqlx(e)
        }
    })?;

    Ok(user)
}

/// Updates a user's password hash.
pub async fn update_user_password(conn: &mut DbConn, user_id: Uuid, password_hash: &str) -> Result<()> {
    let rows_affected = sqlx::query(
        r#"
        UPDATE users
        SET password_hash = $1, updated_at = now()
        WHERE id = $2
        "#,
    )
    .bind(password_hash)
    .bind(user_id)
    .execute(conn)
    .await
    .map_err(Error::Sqlx)?
    .rows_affected();

    if rows_affected == 0 {
        return Err(Error::NotFound(format!("User with ID {} not found", user_id)));
    }

    Ok(())
}

/// Locks the user row and every book the user owns until the transaction ends.
///
/// Holding these locks, a concurrent rent either finished before (and is
/// seen by [`count_blocking_rentals`]) or waits until the deletion commits.
/// Returns `false` when the user does not exist.
pub async fn lock_user_for_deletion(conn: &mut DbConn, user_id: Uuid) -> Result<bool> {
    let locked: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT id
        FROM users
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(Error::Sqlx)?;

    if locked.is_none() {
        return Ok(false);
    }

    sqlx::query(
        r#"
        SELECT id
        FROM books
        WHERE owner_id = $1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(true)
}

/// Counts rentals that block deleting the user: active rentals where the user
/// is the renter, or active rentals on books the user owns.
pub async fn count_blocking_rentals(conn: &mut DbConn, user_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM rentals r
        JOIN books b ON b.id = r.book_id
        WHERE r.status = 'active'
          AND (r.renter_id = $1 OR b.owner_id = $1)
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(count)
}

/// Deletes a user by their ID. Owned rows go with it through ON DELETE CASCADE.
pub async fn delete_user(conn: &mut DbConn, id: Uuid) -> Result<u64> {
    let rows_affected = sqlx::query(
        r#"
        DELETE FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(conn)
    .await
    .map_err(Error::Sqlx)?
    .rows_affected();

    Ok(rows_affected)
}
