use async_trait::async_trait;
use bookineo::{
    AppState, Config, build_router,
    config::MIN_JWT_SECRET_LENGTH,
    database,
    services::{
        chat::ChatService,
        email::{EmailService, LogEmailService},
    },
};
use reqwest::{Client, redirect::Policy};
use secrecy::{ExposeSecret, SecretString};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

const TEST_JWT_SECRET: &str = "bookineo-integration-tests-signing-secret";

/// Email sender that records what would have been sent.
#[derive(Default)]
pub struct CapturingEmailService {
    pub welcome: Mutex<Vec<String>>,
    pub new_message: Mutex<Vec<String>>,
    /// (recipient, token)
    pub password_reset: Mutex<Vec<(String, String)>>,
}

impl CapturingEmailService {
    /// Waits for the background send of a reset token to `email`.
    pub async fn wait_for_reset_token(&self, email: &str) -> Option<String> {
        for _ in 0..50 {
            let token = self
                .password_reset
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(to, _)| to == email)
                .map(|(_, token)| token.clone());
            if token.is_some() {
                return token;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        None
    }
}

#[async_trait]
impl EmailService for CapturingEmailService {
    async fn send_welcome_email(&self, to_email: &str, _first_name: Option<&str>) -> bookineo::Result<()> {
        self.welcome.lock().unwrap().push(to_email.to_string());
        Ok(())
    }

    async fn send_new_message_email(
        &self,
        to_email: &str,
        _sender_name: &str,
        _subject: Option<&str>,
    ) -> bookineo::Result<()> {
        self.new_message.lock().unwrap().push(to_email.to_string());
        Ok(())
    }

    async fn send_password_reset_email(&self, to_email: &str, token: &str) -> bookineo::Result<()> {
        self.password_reset
            .lock()
            .unwrap()
            .push((to_email.to_string(), token.to_string()));
        Ok(())
    }
}

/// Email sender whose every delivery fails.
pub struct FailingEmailService;

#[async_trait]
impl EmailService for FailingEmailService {
    async fn send_welcome_email(&self, _: &str, _: Option<&str>) -> bookineo::Result<()> {
        Err(bookineo::Error::Email("SMTP relay unreachable".to_string()))
    }

    async fn send_new_message_email(&self, _: &str, _: &str, _: Option<&str>) -> bookineo::Result<()> {
        Err(bookineo::Error::Email("SMTP relay unreachable".to_string()))
    }

    async fn send_password_reset_email(&self, _: &str, _: &str) -> bookineo::Result<()> {
        Err(bookineo::Error::Email("SMTP relay unreachable".to_string()))
    }
}

#[derive(Default)]
pub struct TestAppOptions {
    pub email: Option<Arc<dyn EmailService>>,
    /// Base URL of the chat completion endpoint (a wiremock server in tests)
    pub chat_base_url: Option<String>,
}

/// HTTP test application wrapper
///
/// Runs the real router on a random port. Each test gets its own server
/// instance so tests can run in parallel.
pub struct TestApp {
    /// Server base URL (e.g., "http://127.0.0.1:54321")
    pub address: String,
    /// HTTP client for making requests
    pub client: Client,
    pub pool: PgPool,
    pub state: AppState,
}

fn test_config(options: &TestAppOptions) -> Config {
    let mut config = Config::from_env().unwrap_or_default();
    if config.jwt.secret.expose_secret().len() < MIN_JWT_SECRET_LENGTH {
        config.jwt.secret = SecretString::from(TEST_JWT_SECRET.to_string());
    }
    config.chat.base_url = options
        .chat_base_url
        .clone()
        .unwrap_or_else(|| "http://127.0.0.1:9".to_string());
    config.chat.timeout_seconds = 5;
    config
}

impl TestApp {
    /// Starts the app against the configured PostgreSQL database.
    ///
    /// Panics when the database cannot be reached: these tests exercise the
    /// HTTP contract end to end and must not pass without it.
    pub async fn spawn() -> Self {
        Self::spawn_with(TestAppOptions::default()).await
    }

    pub async fn spawn_with(options: TestAppOptions) -> Self {
        let config = test_config(&options);

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(3))
            .connect(config.database.connection_string().expose_secret())
            .await
            .expect("Failed to connect to the test database (set BOOKINEO__DATABASE__*)");
        database::migrate(&pool)
            .await
            .expect("Failed to run migrations");

        Self::start(pool, config, options).await
    }

    /// Starts the app with a pool that never connects until used. For tests
    /// that must not touch the database.
    pub async fn spawn_lazy(options: TestAppOptions) -> Self {
        let config = test_config(&options);
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy(config.database.connection_string().expose_secret())
            .expect("Failed to create lazy pool");

        Self::start(pool, config, options).await
    }

    async fn start(pool: PgPool, config: Config, options: TestAppOptions) -> Self {
        let email = options
            .email
            .unwrap_or_else(|| Arc::new(LogEmailService::new("http://localhost:3000")));
        let chat = ChatService::new(config.chat.clone()).expect("Failed to build chat service");
        let state = AppState::new(pool.clone(), config, email, chat);
        let app = build_router(state.clone());

        // Bind to random port (port 0 tells OS to assign available port)
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{port}");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            address,
            client,
            pool,
            state,
        }
    }

    /// Get the full URL for an API endpoint
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}
