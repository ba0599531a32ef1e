use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Highest page whose offset still fits in an i64 at any page size.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BookStatus {
    Available,
    Rented,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub publication_year: Option<i32>,
    pub category_id: Option<Uuid>,
    pub price: f64,
    pub owner_id: Uuid,
    pub image_url: Option<String>,
    pub status: BookStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A book joined with its category and owner names, as returned by reads.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub book: Book,
    pub category_name: Option<String>,
    pub owner_first_name: Option<String>,
    pub owner_last_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub publication_year: Option<i32>,
    pub category_id: Option<Uuid>,
    pub price: f64,
    pub owner_id: Uuid,
    pub image_url: Option<String>,
    pub status: BookStatus,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publication_year: Option<i32>,
    pub category_id: Option<Uuid>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub status: Option<BookStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publication_year: Option<i32>,
    pub category_id: Option<Uuid>,
    pub price: Option<f64>,
    pub owner_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub status: Option<BookStatus>,
}

/// Query string of `GET /books`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BookListQuery {
    pub status: Option<BookStatus>,
    pub category_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Optional predicates combined with AND when listing books.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    pub status: Option<BookStatus>,
    pub category_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    /// Case-insensitive substring of the author.
    pub author: Option<String>,
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Clamps raw query values: 1 <= page <= MAX_PAGE, 1 <= limit <= MAX_PAGE_SIZE.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_books: i64,
    pub limit: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Pagination {
    pub fn new(request: PageRequest, total_books: i64) -> Self {
        let total_pages = (total_books + request.limit - 1) / request.limit;
        Self {
            current_page: request.page,
            total_pages,
            total_books,
            limit: request.limit,
            has_next_page: request.page < total_pages,
            has_previous_page: request.page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookPage {
    pub books: Vec<BookListing>,
    pub pagination: Pagination,
}

impl BookListQuery {
    pub fn into_parts(self) -> (BookFilter, PageRequest) {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        (
            BookFilter {
                status: self.status,
                category_id: self.category_id,
                owner_id: self.owner_id,
                author: non_blank(self.author),
                title: non_blank(self.title),
            },
            PageRequest::new(self.page, self.limit),
        )
    }
}
