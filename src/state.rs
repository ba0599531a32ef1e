use crate::{
    config::Config,
    database::DbPool,
    services::{chat::ChatService, email::EmailService, notifier::Notifier},
};
use std::sync::Arc;

/// Application state shared across all HTTP handlers
///
/// Every shared resource is built once at startup and injected here.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool for accessing the database
    pub pool: DbPool,
    pub config: Arc<Config>,
    /// Live notification connections
    pub notifier: Arc<Notifier>,
    /// Transactional email sender
    pub email: Arc<dyn EmailService>,
    /// Bridge to the chat completion endpoint
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        config: Config,
        email: Arc<dyn EmailService>,
        chat: ChatService,
    ) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            notifier: Arc::new(Notifier::new()),
            email,
            chat: Arc::new(chat),
        }
    }
}
