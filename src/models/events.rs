use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::messages::Message;

/// Events pushed to connected clients over the notification stream.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum NotificationEvent {
    Connected {
        user_id: Uuid,
    },
    NewMessage {
        message: Message,
    },
    MessageRead {
        message_id: Uuid,
        reader_id: Uuid,
        read_at: DateTime<Utc>,
    },
}

impl NotificationEvent {
    /// SSE `event:` name the frontend listens for.
    pub fn event_name(&self) -> &'static str {
        match self {
            NotificationEvent::Connected { .. } => "connected",
            NotificationEvent::NewMessage { .. } => "newMessage",
            NotificationEvent::MessageRead { .. } => "messageRead",
        }
    }
}
