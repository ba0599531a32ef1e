use crate::{
    DbConn, DbPool,
    config::ChatConfig,
    error::{Error, Result},
    models::chat::{
        CatalogSnapshot, ChatMessageRole, ChatRequest, ChatResponse, ChatStatus, ChatTurn,
    },
    queries::{books, categories},
};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::time::Duration;

/// Answer given to questions that are not about the catalog.
pub const REFUSAL: &str = "I'm the Bookineo assistant and I can only answer questions about our books: \
titles, authors, prices, categories and availability. How can I help you find a book?";

const STATUS_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

const SYSTEM_PROMPT: &str = "You are the assistant of Bookineo, a platform where readers rent books \
to each other. Answer only questions about the books, authors, categories, prices and \
availability listed in the catalog below. Answer in the language of the question, be concise, \
and never invent a book that is not in the catalog.";

/// Vocabulary that marks a question as being about the catalog, in French and English.
const CATALOG_KEYWORDS: &[&str] = &[
    // English
    "book", "novel", "author", "writer", "title", "price", "cost", "cheap", "expensive",
    "category", "categories", "genre", "available", "availability", "rent", "borrow", "search",
    "find", "looking for", "recommend", "suggest", "catalog", "library", "stats", "statistic",
    "how many", "publication", "published",
    // French
    "livre", "roman", "auteur", "écrivain", "ecrivain", "titre", "prix", "coût", "cout",
    "pas cher", "catégorie", "categorie", "disponible", "disponibilité", "louer", "location",
    "emprunt", "cherche", "recherche", "trouver", "recommande", "conseil", "catalogue",
    "bibliothèque", "statistique", "combien", "publié", "parution",
];

/// Whether a free-text question is about the catalog.
pub fn is_book_related(message: &str) -> bool {
    let lowered = message.to_lowercase();
    CATALOG_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

/// Formats a catalog snapshot as a plain-text block for the system prompt.
pub fn build_context(snapshot: &CatalogSnapshot) -> String {
    let mut context = String::from("CATALOG\n");

    let stats = &snapshot.stats;
    let _ = writeln!(
        context,
        "Total books: {}, available books: {}",
        stats.total_books, stats.available_books
    );
    if let (Some(min), Some(avg), Some(max)) = (stats.min_price, stats.avg_price, stats.max_price) {
        let _ = writeln!(
            context,
            "Prices across the catalog: min {:.2}, average {:.2}, max {:.2}",
            min, avg, max
        );
    }

    if snapshot.categories.is_empty() {
        context.push_str("Categories: none\n");
    } else {
        let _ = writeln!(context, "Categories: {}", snapshot.categories.join(", "));
    }

    if snapshot.books.is_empty() {
        context.push_str("No book is available right now.\n");
    } else {
        context.push_str("Available books:\n");
        for book in &snapshot.books {
            let _ = write!(context, "- \"{}\" by {}, {:.2}", book.title, book.author, book.price);
            if let Some(year) = book.publication_year {
                let _ = write!(context, ", {}", year);
            }
            if let Some(category) = &book.category_name {
                let _ = write!(context, ", {}", category);
            }
            context.push('\n');
        }
    }

    context
}

/// Assembles the completion messages: system prompt with the catalog context,
/// the last `history_turns` user/assistant turns, then the question.
pub fn build_messages(
    context: &str,
    history: &[ChatTurn],
    message: &str,
    history_turns: usize,
) -> Vec<ChatTurn> {
    let previous: Vec<&ChatTurn> = history
        .iter()
        .filter(|turn| turn.role != ChatMessageRole::System)
        .collect();
    let skip = previous.len().saturating_sub(history_turns);

    let mut messages = Vec::with_capacity(history_turns + 2);
    messages.push(ChatTurn {
        role: ChatMessageRole::System,
        content: format!("{}\n\n{}", SYSTEM_PROMPT, context),
    });
    messages.extend(previous.into_iter().skip(skip).cloned());
    messages.push(ChatTurn {
        role: ChatMessageRole::User,
        content: message.to_string(),
    });
    messages
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Bridge to an OpenAI-compatible chat completion endpoint.
pub struct ChatService {
    client: reqwest::Client,
    config: ChatConfig,
}

impl ChatService {
    pub fn new(config: ChatConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Answers a chat request. Off-topic questions get the refusal without
    /// touching the database or the model.
    pub async fn reply(&self, pool: &DbPool, request: ChatRequest) -> Result<ChatResponse> {
        let message = request
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| Error::validation("message", "Message is required"))?;

        if !is_book_related(message) {
            tracing::debug!("Chat question rejected by the catalog keyword gate");
            return Ok(ChatResponse {
                response: REFUSAL.to_string(),
                success: true,
            });
        }

        let snapshot = {
            let mut conn = pool.acquire().await?;
            load_snapshot(&mut conn, self.config.max_context_books).await?
        };
        let context = build_context(&snapshot);
        let messages = build_messages(&context, &request.history, message, self.config.history_turns);

        let response = self.complete(&messages).await?;
        Ok(ChatResponse {
            response,
            success: true,
        })
    }

    /// Sends the messages to `/v1/chat/completions` and returns the first choice.
    pub async fn complete(&self, messages: &[ChatTurn]) -> Result<String> {
        let url = self.endpoint("/v1/chat/completions");
        let body = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: 0.7,
            stream: false,
        };

        let started = std::time::Instant::now();
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Chat completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "Chat completion endpoint returned {}: {}",
                status, detail
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Malformed chat completion response: {}", e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Error::Upstream("Chat completion response has no content".to_string()))?;

        tracing::info!(
            model = %self.config.model,
            duration_ms = started.elapsed().as_millis() as u64,
            "Chat completion received"
        );
        Ok(content)
    }

    /// Checks `/v1/models`. Never fails: an unreachable endpoint reports `offline`.
    pub async fn status(&self) -> ChatStatus {
        let online = match self
            .client
            .get(self.endpoint("/v1/models"))
            .timeout(STATUS_CHECK_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "Chat endpoint status check failed");
                false
            }
        };

        ChatStatus {
            status: if online { "online" } else { "offline" }.to_string(),
            model: self.config.model.clone(),
            base_url: self.config.base_url.clone(),
        }
    }
}

/// Reads what the assistant is told about the catalog.
pub async fn load_snapshot(conn: &mut DbConn, max_books: i64) -> Result<CatalogSnapshot> {
    let books = books::list_available_catalog(conn, max_books).await?;
    let categories = categories::list_categories(conn)
        .await?
        .into_iter()
        .map(|category| category.name)
        .collect();
    let stats = books::catalog_stats(conn).await?;

    Ok(CatalogSnapshot {
        books,
        categories,
        stats,
    })
}
