use crate::DbConn;
use crate::{
    error::{Error, Result},
    models::{
        events::NotificationEvent,
        messages::{Message, MessageDetails, NewMessage, SendMessageRequest, UnreadCount},
    },
    queries::{messages, users},
    services::{email::EmailService, notifier::Notifier},
    validation::{MAX_SUBJECT_LENGTH, collect_missing, sanitize_optional, validate_length},
};
use std::sync::Arc;
use uuid::Uuid;

fn message_not_found(id: Uuid) -> Error {
    Error::NotFound(format!("Message {} not found", id))
}

fn ensure_self(caller_id: Uuid, user_id: Uuid) -> Result<()> {
    if caller_id != user_id {
        return Err(Error::Forbidden(
            "You can only access your own messages".to_string(),
        ));
    }
    Ok(())
}

/// Sends a message, then notifies the recipient by email and on their live
/// connections. Neither notification can fail the request.
pub async fn send_message(
    conn: &mut DbConn,
    notifier: &Notifier,
    email: &Arc<dyn EmailService>,
    caller_id: Uuid,
    request: SendMessageRequest,
) -> Result<Message> {
    if request.sender_id.is_some_and(|sender_id| sender_id != caller_id) {
        return Err(Error::Forbidden(
            "You can only send messages as yourself".to_string(),
        ));
    }

    let content = sanitize_optional(request.content);
    let recipient_email = sanitize_optional(request.recipient_email);

    let missing = collect_missing([
        (
            "recipient_id",
            request.recipient_id.is_none() && recipient_email.is_none(),
        ),
        ("content", content.is_none()),
    ]);
    let Some(content) = content.filter(|_| missing.is_empty()) else {
        return Err(Error::missing_fields(&missing));
    };
    let subject = sanitize_optional(request.subject);
    if let Some(subject) = &subject {
        validate_length("subject", subject, MAX_SUBJECT_LENGTH)?;
    }

    let recipient = match (request.recipient_id, recipient_email) {
        (Some(recipient_id), None) => users::get_user_by_id(conn, recipient_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User {} not found", recipient_id)))?,
        (None, Some(recipient_email)) => users::get_user_by_email(conn, &recipient_email)
            .await?
            .ok_or_else(|| Error::NotFound(format!("No user with email {}", recipient_email)))?,
        _ => {
            return Err(Error::validation(
                "recipient_id",
                "Provide either recipient_id or recipient_email, not both",
            ));
        }
    };

    if recipient.id == caller_id {
        return Err(Error::BadRequest(
            "You cannot send a message to yourself".to_string(),
        ));
    }

    let sender = users::get_user_by_id(conn, caller_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {} not found", caller_id)))?;

    let message = messages::create_message(
        conn,
        NewMessage {
            sender_id: caller_id,
            recipient_id: recipient.id,
            subject,
            content,
        },
    )
    .await?;

    tracing::info!(
        message_id = %message.id,
        sender_id = %message.sender_id,
        recipient_id = %message.recipient_id,
        "Message sent"
    );

    let email = Arc::clone(email);
    let recipient_address = recipient.email.clone();
    let sender_name = sender.display_name();
    let subject = message.subject.clone();
    tokio::spawn(async move {
        if let Err(e) = email
            .send_new_message_email(&recipient_address, &sender_name, subject.as_deref())
            .await
        {
            tracing::warn!(error = %e, "Failed to send new message email");
        }
    });

    notifier.emit_to_user(
        message.recipient_id,
        NotificationEvent::NewMessage {
            message: message.clone(),
        },
    );

    Ok(message)
}

/// Flips an unread message to read on behalf of its recipient and tells the
/// sender. Returns the updated message, or `None` if it was already read.
async fn flip_read(
    conn: &mut DbConn,
    notifier: &Notifier,
    message_id: Uuid,
    reader_id: Uuid,
) -> Result<Option<Message>> {
    let updated = messages::mark_message_read_if_unread(conn, message_id, reader_id).await?;

    if let Some(message) = &updated {
        notifier.emit_to_user(
            message.sender_id,
            NotificationEvent::MessageRead {
                message_id: message.id,
                reader_id,
                read_at: message.updated_at,
            },
        );
    }

    Ok(updated)
}

/// Reads one message. Opening it as the recipient marks it read.
pub async fn get_message(
    conn: &mut DbConn,
    notifier: &Notifier,
    caller_id: Uuid,
    id: Uuid,
) -> Result<MessageDetails> {
    let mut details = messages::get_message_details_by_id(conn, id)
        .await?
        .ok_or_else(|| message_not_found(id))?;

    let message = &details.message;
    if message.sender_id != caller_id && message.recipient_id != caller_id {
        return Err(Error::Forbidden(
            "You are not a participant of this message".to_string(),
        ));
    }

    if message.recipient_id == caller_id && !message.is_read {
        if let Some(updated) = flip_read(conn, notifier, id, caller_id).await? {
            details.message = updated;
        }
    }

    Ok(details)
}

/// Marks a message read. Only its recipient may do so; repeating is a no-op.
pub async fn mark_as_read(
    conn: &mut DbConn,
    notifier: &Notifier,
    caller_id: Uuid,
    id: Uuid,
) -> Result<Message> {
    let message = messages::get_message_by_id(conn, id)
        .await?
        .ok_or_else(|| message_not_found(id))?;

    if message.recipient_id != caller_id {
        return Err(Error::Forbidden(
            "Only the recipient can mark a message as read".to_string(),
        ));
    }

    if message.is_read {
        return Ok(message);
    }

    Ok(flip_read(conn, notifier, id, caller_id)
        .await?
        .unwrap_or(message))
}

/// Deletes a message. Only its sender may do so.
pub async fn delete_message(conn: &mut DbConn, caller_id: Uuid, id: Uuid) -> Result<()> {
    let message = messages::get_message_by_id(conn, id)
        .await?
        .ok_or_else(|| message_not_found(id))?;

    if message.sender_id != caller_id {
        return Err(Error::Forbidden(
            "Only the sender can delete a message".to_string(),
        ));
    }

    messages::delete_message(conn, id).await?;
    tracing::info!(message_id = %id, "Message deleted");
    Ok(())
}

pub async fn list_messages(conn: &mut DbConn, caller_id: Uuid, user_id: Uuid) -> Result<Vec<MessageDetails>> {
    ensure_self(caller_id, user_id)?;
    messages::list_messages_for_user(conn, user_id).await
}

pub async fn unread_count(conn: &mut DbConn, caller_id: Uuid, user_id: Uuid) -> Result<UnreadCount> {
    ensure_self(caller_id, user_id)?;
    let count = messages::count_unread(conn, user_id).await?;
    Ok(UnreadCount { count })
}
