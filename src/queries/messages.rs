use crate::{
    error::{Error, Result},
    models::messages::{Message, MessageDetails, NewMessage},
};
use uuid::Uuid;

use crate::DbConn;

const MESSAGE_COLUMNS: &str =
    "m.id, m.sender_id, m.recipient_id, m.subject, m.content, m.is_read, m.sent_at, m.created_at, m.updated_at";

fn details_select() -> String {
    format!(
        "SELECT {MESSAGE_COLUMNS}, \
         s.email AS sender_email, s.first_name AS sender_first_name, s.last_name AS sender_last_name, \
         r.email AS recipient_email, r.first_name AS recipient_first_name, r.last_name AS recipient_last_name \
         FROM messages m \
         JOIN users s ON s.id = m.sender_id \
         JOIN users r ON r.id = m.recipient_id"
    )
}

/// Creates a new message.
pub async fn create_message(conn: &mut DbConn, new_message: NewMessage) -> Result<Message> {
    let message = sqlx::query_as::<_, Message>(&format!(
        r#"
        INSERT INTO messages AS m (sender_id, recipient_id, subject, content)
        VALUES ($1, $2, $3, $4)
        RETURNING {MESSAGE_COLUMNS}
        "#
    ))
    .bind(new_message.sender_id)
    .bind(new_message.recipient_id)
    .bind(&new_message.subject)
    .bind(&new_message.content)
    .fetch_one(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(message)
}

/// Gets a single message by ID. The message may not exist.
pub async fn get_message_by_id(conn: &mut DbConn, id: Uuid) -> Result<Option<Message>> {
    let message = sqlx::query_as::<_, Message>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages m WHERE m.id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(message)
}

/// Gets a single message with both participants resolved.
pub async fn get_message_details_by_id(conn: &mut DbConn, id: Uuid) -> Result<Option<MessageDetails>> {
    let message = sqlx::query_as::<_, MessageDetails>(&format!("{} WHERE m.id = $1", details_select()))
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(message)
}

/// Lists every message sent or received by the user, newest first.
pub async fn list_messages_for_user(conn: &mut DbConn, user_id: Uuid) -> Result<Vec<MessageDetails>> {
    let messages = sqlx::query_as::<_, MessageDetails>(&format!(
        "{} WHERE m.sender_id = $1 OR m.recipient_id = $1 ORDER BY m.sent_at DESC, m.id DESC",
        details_select()
    ))
    .bind(user_id)
    .fetch_all(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(messages)
}

/// Marks a message read if it is still unread and addressed to `recipient_id`.
/// Returns `None` when nothing changed, so the flip happens exactly once.
pub async fn mark_message_read_if_unread(
    conn: &mut DbConn,
    id: Uuid,
    recipient_id: Uuid,
) -> Result<Option<Message>> {
    let message = sqlx::query_as::<_, Message>(&format!(
        r#"
        UPDATE messages AS m
        SET is_read = true, updated_at = now()
        WHERE m.id = $1 AND m.recipient_id = $2 AND m.is_read = false
        RETURNING {MESSAGE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(recipient_id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(message)
}

/// Counts unread messages addressed to the user.
pub async fn count_unread(conn: &mut DbConn, recipient_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM messages WHERE recipient_id = $1 AND is_read = false",
    )
    .bind(recipient_id)
    .fetch_one(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(count)
}

/// Deletes a message by ID.
pub async fn delete_message(conn: &mut DbConn, id: Uuid) -> Result<u64> {
    let rows_affected = sqlx::query("DELETE FROM messages WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await
        .map_err(Error::Sqlx)?
        .rows_affected();

    Ok(rows_affected)
}
