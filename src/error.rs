use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// Import Axum types for HTTP response conversion
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Public message returned when the chat completion endpoint cannot be reached.
pub const CHATBOT_UNAVAILABLE: &str = "Cannot connect to the chatbot service";

/// Structured validation errors with field-level error mapping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ValidationErrors {
    Single { field: String, message: String },
    Multiple { fields: BTreeMap<String, String> },
}

/// The custom error type for the application.
#[derive(Debug, Error)]
pub enum Error {
    /// An error originating from the sqlx library.
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A validation error with field-level details.
    #[error("Validation error: {0:?}")]
    Validation(ValidationErrors),

    /// A request that is well formed but not acceptable in the current state
    /// (book not available, rental already returned, ...).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A not found error (resource does not exist).
    #[error("Not found: {0}")]
    NotFound(String),

    /// A forbidden error (user lacks permission).
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// A conflict error (the operation would break referential rules).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A token that is present but malformed, badly signed or expired.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// An external HTTP dependency failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// An email could not be built or delivered.
    #[error("Email error: {0}")]
    Email(String),

    /// A JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// A type alias for `Result<T, Error>` to simplify function signatures.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Validation failure on a single field.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Error::Validation(ValidationErrors::Single {
            field: field.to_string(),
            message: message.into(),
        })
    }

    /// Validation failure listing every missing required field.
    pub fn missing_fields(fields: &[&str]) -> Self {
        if let [field] = fields {
            return Self::validation(field, format!("{} is required", field));
        }
        Error::Validation(ValidationErrors::Multiple {
            fields: fields
                .iter()
                .map(|field| (field.to_string(), format!("{} is required", field)))
                .collect(),
        })
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Forbidden(_) | Error::InvalidToken(_) => StatusCode::FORBIDDEN,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Authentication(_) => StatusCode::UNAUTHORIZED,
            Error::Sqlx(_)
            | Error::Upstream(_)
            | Error::Email(_)
            | Error::Json(_)
            | Error::Internal(_)
            | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::validation("body", rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::validation("path", rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::validation("query", rejection.body_text())
    }
}

/// Convert custom Error to HTTP response
///
/// Client errors carry their message; server-side failures are logged with
/// full detail and answered with a generic body.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            Error::Validation(errors) => match errors {
                ValidationErrors::Single { field, message } => {
                    serde_json::json!({
                        "error": message,
                        "code": "VALIDATION_ERROR",
                        "fields": {
                            field: message
                        }
                    })
                }
                ValidationErrors::Multiple { fields } => {
                    let listed = fields.keys().cloned().collect::<Vec<_>>().join(", ");
                    serde_json::json!({
                        "error": format!("Missing or invalid fields: {}", listed),
                        "code": "VALIDATION_ERROR",
                        "fields": fields
                    })
                }
            },
            Error::BadRequest(msg) => serde_json::json!({
                "error": msg,
                "code": "BAD_REQUEST"
            }),
            Error::NotFound(msg) => serde_json::json!({
                "error": msg,
                "code": "NOT_FOUND"
            }),
            Error::Forbidden(msg) => serde_json::json!({
                "error": msg,
                "code": "FORBIDDEN"
            }),
            Error::Conflict(msg) => serde_json::json!({
                "error": msg,
                "code": "CONFLICT"
            }),
            Error::Authentication(msg) => serde_json::json!({
                "error": msg,
                "code": "AUTHENTICATION_FAILED"
            }),
            Error::InvalidToken(msg) => serde_json::json!({
                "error": msg,
                "code": "INVALID_TOKEN"
            }),
            Error::Upstream(detail) => {
                tracing::error!(error = %detail, "Upstream dependency failed");
                serde_json::json!({
                    "error": CHATBOT_UNAVAILABLE,
                    "code": "UPSTREAM_ERROR"
                })
            }
            other => {
                tracing::error!(error = %other, "Request failed with internal error");
                serde_json::json!({
                    "error": "Internal server error",
                    "code": "INTERNAL_ERROR"
                })
            }
        };

        (status, Json(body)).into_response()
    }
}
