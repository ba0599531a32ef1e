use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub subject: Option<String>,
    pub content: String,
    pub is_read: bool,
    pub sent_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A message with both participants resolved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MessageDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub message: Message,
    pub sender_email: String,
    pub sender_first_name: Option<String>,
    pub sender_last_name: Option<String>,
    pub recipient_email: String,
    pub recipient_first_name: Option<String>,
    pub recipient_last_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub subject: Option<String>,
    pub content: String,
}

/// `POST /messages` body. The recipient is given either by id or by email.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SendMessageRequest {
    pub sender_id: Option<Uuid>,
    pub recipient_id: Option<Uuid>,
    pub recipient_email: Option<String>,
    pub subject: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnreadCount {
    pub count: i64,
}
