use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMessageRole {
    System,
    User,
    Assistant,
}

/// One previous turn of the conversation, as kept by the frontend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: ChatMessageRole,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub response: String,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatStatus {
    /// `online` or `offline`
    pub status: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct CatalogBook {
    pub title: String,
    pub author: String,
    pub price: f64,
    pub publication_year: Option<i32>,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct CatalogStats {
    pub total_books: i64,
    pub available_books: i64,
    pub min_price: Option<f64>,
    pub avg_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// What the assistant knows about the catalog when answering a question.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CatalogSnapshot {
    pub books: Vec<CatalogBook>,
    pub categories: Vec<String>,
    pub stats: CatalogStats,
}
