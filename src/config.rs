use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use std::fmt;

/// Minimum accepted length of the JWT signing secret, in bytes.
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub email: EmailConfig,
    pub chat: ChatConfig,
    pub password_reset: PasswordResetConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub user: String,
    #[serde(skip_serializing)]
    pub password: SecretString,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JwtConfig {
    #[serde(skip_serializing)]
    pub secret: SecretString,
    /// Access token lifetime. Defaults to seven days.
    pub expiration_minutes: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Comma separated list of origins, or `*`.
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailConfig {
    /// SMTP relay host. When unset, emails are logged instead of sent.
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: String,
    #[serde(skip_serializing)]
    pub smtp_password: SecretString,
    /// One of `starttls`, `tls` or `none`.
    pub smtp_encryption: String,
    pub from_email: String,
    pub from_name: String,
    /// Base URL of the frontend, used to build links in emails.
    pub frontend_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Base URL of an OpenAI-compatible completion server (LM Studio, Ollama, ...).
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub max_context_books: i64,
    pub history_turns: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PasswordResetConfig {
    pub token_ttl_minutes: i64,
    pub cleanup_interval_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables, with defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let loaded = Self::from_env()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Layers `BOOKINEO__SECTION__KEY` environment variables over the defaults
    /// without validating the result.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            // e.g., BOOKINEO__DATABASE__USER="my_user"
            .add_source(
                config::Environment::with_prefix("BOOKINEO")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Rejects configurations the server cannot safely start with.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.jwt.secret.expose_secret().len() < MIN_JWT_SECRET_LENGTH {
            return Err(config::ConfigError::Message(format!(
                "jwt.secret must be at least {} bytes (set BOOKINEO__JWT__SECRET)",
                MIN_JWT_SECRET_LENGTH
            )));
        }
        if self.database.host.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "database.host cannot be empty".to_string(),
            ));
        }
        if self.jwt.expiration_minutes <= 0 {
            return Err(config::ConfigError::Message(
                "jwt.expiration_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    /// Constructs the database connection string.
    pub fn connection_string(&self) -> SecretString {
        SecretString::from(format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.host,
            self.port,
            self.database
        ))
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl CorsConfig {
    /// Parsed origin list; `None` means any origin is allowed.
    pub fn origins(&self) -> Option<Vec<String>> {
        let trimmed = self.allowed_origins.trim();
        if trimmed == "*" {
            return None;
        }
        Some(
            trimmed
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        )
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

// Default values for the database configuration
impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            user: "postgres".to_string(),
            password: "password".to_string().into(),
            host: "localhost".to_string(),
            port: 5432,
            database: "bookineo".to_string(),
            max_connections: 10,
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            // Empty on purpose: a secret must be provided through the environment.
            secret: String::new().into(),
            expiration_minutes: 7 * 24 * 60,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: "http://localhost:3000".to_string(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new().into(),
            smtp_encryption: "starttls".to_string(),
            from_email: "no-reply@bookineo.local".to_string(),
            from_name: "Bookineo".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234".to_string(),
            model: "local-model".to_string(),
            timeout_seconds: 60,
            max_context_books: 20,
            history_turns: 3,
        }
    }
}

impl Default for PasswordResetConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: 60,
            cleanup_interval_seconds: 3600,
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secrets are skipped through #[serde(skip_serializing)]
        match serde_json::to_string_pretty(&self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "Error serializing config"),
        }
    }
}
