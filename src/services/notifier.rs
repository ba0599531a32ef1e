use crate::models::events::NotificationEvent;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Pending events kept per connection before pushes start being dropped.
pub const CONNECTION_BUFFER: usize = 32;

/// In-memory registry of live notification connections, keyed by user.
///
/// A user may hold several connections (tabs, devices); every one of them
/// receives every push. Nothing is replayed for users who are offline.
pub struct Notifier {
    connections: scc::HashMap<Uuid, HashMap<Uuid, mpsc::Sender<NotificationEvent>>>,
    buffer: usize,
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_buffer(CONNECTION_BUFFER)
    }

    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            connections: scc::HashMap::new(),
            buffer: buffer.max(1),
        }
    }

    /// Adds a connection for `user_id`. The connection is removed when the
    /// returned subscription is dropped.
    pub fn register(self: &Arc<Self>, user_id: Uuid) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.buffer);
        let connection_id = Uuid::now_v7();

        self.connections
            .entry_sync(user_id)
            .or_default()
            .get_mut()
            .insert(connection_id, sender);

        tracing::debug!(user_id = %user_id, connection_id = %connection_id, "Notification connection registered");

        Subscription {
            user_id,
            connection_id,
            receiver,
            notifier: Arc::clone(self),
        }
    }

    // Runs from Drop, so it must not await.
    fn unregister(&self, user_id: Uuid, connection_id: Uuid) {
        let _ = self.connections.remove_if_sync(&user_id, |user_connections| {
            user_connections.remove(&connection_id);
            user_connections.is_empty()
        });
        tracing::debug!(user_id = %user_id, connection_id = %connection_id, "Notification connection removed");
    }

    /// Pushes an event to every live connection of a user without waiting.
    /// Returns how many connections accepted it.
    pub fn emit_to_user(&self, user_id: Uuid, event: NotificationEvent) -> usize {
        self.connections
            .read_sync(&user_id, |_, user_connections| {
                let mut delivered = 0;
                for (connection_id, sender) in user_connections {
                    match sender.try_send(event.clone()) {
                        Ok(()) => delivered += 1,
                        Err(e) => tracing::debug!(
                            user_id = %user_id,
                            connection_id = %connection_id,
                            event = event.event_name(),
                            error = %e,
                            "Dropped notification"
                        ),
                    }
                }
                delivered
            })
            .unwrap_or(0)
    }

    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.connections.read_sync(&user_id, |_, _| ()).is_some()
    }

    pub fn connection_count(&self, user_id: Uuid) -> usize {
        self.connections
            .read_sync(&user_id, |_, user_connections| user_connections.len())
            .unwrap_or(0)
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

/// One registered connection. Yields the events pushed to it.
pub struct Subscription {
    user_id: Uuid,
    connection_id: Uuid,
    receiver: mpsc::Receiver<NotificationEvent>,
    notifier: Arc<Notifier>,
}

impl Subscription {
    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    pub async fn recv(&mut self) -> Option<NotificationEvent> {
        self.receiver.recv().await
    }
}

impl Stream for Subscription {
    type Item = NotificationEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.notifier.unregister(self.user_id, self.connection_id);
    }
}
