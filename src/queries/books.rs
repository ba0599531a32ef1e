use crate::{
    error::{Error, Result},
    models::{
        books::{Book, BookFilter, BookListing, BookStatus, NewBook, PageRequest, UpdateBook},
        chat::{CatalogBook, CatalogStats},
    },
};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::DbConn;

/// Book columns read from a table aliased `b`. NUMERIC prices are read as FLOAT8.
const BOOK_COLUMNS: &str = "b.id, b.title, b.author, b.publication_year, b.category_id, \
     b.price::FLOAT8 AS price, b.owner_id, b.image_url, b.status, b.created_at, b.updated_at";

fn listing_select() -> String {
    format!(
        "SELECT {BOOK_COLUMNS}, c.name AS category_name, \
         u.first_name AS owner_first_name, u.last_name AS owner_last_name \
         FROM books b \
         LEFT JOIN categories c ON c.id = b.category_id \
         LEFT JOIN users u ON u.id = b.owner_id"
    )
}

/// Escapes LIKE wildcards so user input only ever matches literally.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Appends the WHERE clause for `filter`, binding every value.
pub fn push_book_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(status) = filter.status {
        builder.push(" AND b.status = ").push_bind(status);
    }
    if let Some(category_id) = filter.category_id {
        builder.push(" AND b.category_id = ").push_bind(category_id);
    }
    if let Some(owner_id) = filter.owner_id {
        builder.push(" AND b.owner_id = ").push_bind(owner_id);
    }
    if let Some(author) = &filter.author {
        builder
            .push(" AND b.author ILIKE ")
            .push_bind(format!("%{}%", escape_like(author.trim())));
    }
    if let Some(title) = &filter.title {
        builder
            .push(" AND b.title ILIKE ")
            .push_bind(format!("%{}%", escape_like(title.trim())));
    }
}

/// Builds the page query for `GET /books`.
pub fn book_page_query(filter: &BookFilter, page: PageRequest) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(listing_select());
    push_book_filter(&mut builder, filter);
    builder
        .push(" ORDER BY b.created_at DESC, b.id LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
    builder
}

/// Builds the COUNT query matching [`book_page_query`].
pub fn book_count_query(filter: &BookFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM books b");
    push_book_filter(&mut builder, filter);
    builder
}

/// Lists one page of books matching the filter.
pub async fn list_books(conn: &mut DbConn, filter: &BookFilter, page: PageRequest) -> Result<Vec<BookListing>> {
    let mut builder = book_page_query(filter, page);
    let books = builder
        .build_query_as::<BookListing>()
        .fetch_all(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(books)
}

/// Counts books matching the filter.
pub async fn count_books(conn: &mut DbConn, filter: &BookFilter) -> Result<i64> {
    let mut builder = book_count_query(filter);
    let count = builder
        .build_query_scalar::<i64>()
        .fetch_one(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(count)
}

/// Creates a new book.
pub async fn create_book(conn: &mut DbConn, new_book: NewBook) -> Result<Book> {
    let book = sqlx::query_as::<_, Book>(&format!(
        r#"
        INSERT INTO books AS b
            (title, author, publication_year, category_id, price, owner_id, image_url, status)
        VALUES ($1, $2, $3, $4, $5::NUMERIC, $6, $7, $8)
        RETURNING {BOOK_COLUMNS}
        "#
    ))
    .bind(&new_book.title)
    .bind(&new_book.author)
    .bind(new_book.publication_year)
    .bind(new_book.category_id)
    .bind(new_book.price)
    .bind(new_book.owner_id)
    .bind(&new_book.image_url)
    .bind(new_book.status)
    .fetch_one(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(book)
}

/// Gets a single book by ID. The book may not exist.
pub async fn get_book_by_id(conn: &mut DbConn, id: Uuid) -> Result<Option<Book>> {
    let book = sqlx::query_as::<_, Book>(&format!(
        "SELECT {BOOK_COLUMNS} FROM books b WHERE b.id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(book)
}

/// Gets a single book with its category and owner names.
pub async fn get_book_listing_by_id(conn: &mut DbConn, id: Uuid) -> Result<Option<BookListing>> {
    let book = sqlx::query_as::<_, BookListing>(&format!("{} WHERE b.id = $1", listing_select()))
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(book)
}

/// Updates the given columns of a book; `None` fields keep their value.
pub async fn update_book(conn: &mut DbConn, id: Uuid, update: UpdateBook) -> Result<Option<Book>> {
    let book = sqlx::query_as::<_, Book>(&format!(
        r#"
        UPDATE books AS b
        SET title = COALESCE($1, b.title),
            author = COALESCE($2, b.author),
            publication_year = COALESCE($3, b.publication_year),
            category_id = COALESCE($4, b.category_id),
            price = COALESCE($5::NUMERIC, b.price),
            image_url = COALESCE($6, b.image_url),
            status = COALESCE($7, b.status),
            updated_at = now()
        WHERE b.id = $8
        RETURNING {BOOK_COLUMNS}
        "#
    ))
    .bind(update.title)
    .bind(update.author)
    .bind(update.publication_year)
    .bind(update.category_id)
    .bind(update.price)
    .bind(update.image_url)
    .bind(update.status)
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(book)
}

/// Flips an available book to `rented`. Returns `None` when the book is
/// missing or not available; the row stays locked until the transaction ends.
pub async fn mark_book_rented_if_available(conn: &mut DbConn, id: Uuid) -> Result<Option<Book>> {
    let book = sqlx::query_as::<_, Book>(&format!(
        r#"
        UPDATE books AS b
        SET status = 'rented', updated_at = now()
        WHERE b.id = $1 AND b.status = 'available'
        RETURNING {BOOK_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(book)
}

/// Sets the status of a book unconditionally.
pub async fn set_book_status(conn: &mut DbConn, id: Uuid, status: BookStatus) -> Result<Option<Book>> {
    let book = sqlx::query_as::<_, Book>(&format!(
        r#"
        UPDATE books AS b
        SET status = $1, updated_at = now()
        WHERE b.id = $2
        RETURNING {BOOK_COLUMNS}
        "#
    ))
    .bind(status)
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(book)
}

/// True when the book has an open rental.
pub async fn has_active_rental(conn: &mut DbConn, book_id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM rentals WHERE book_id = $1 AND status = 'active')",
    )
    .bind(book_id)
    .fetch_one(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(exists)
}

/// Deletes a book. Its rental history goes with it.
pub async fn delete_book(conn: &mut DbConn, id: Uuid) -> Result<u64> {
    let rows_affected = sqlx::query("DELETE FROM books WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await
        .map_err(Error::Sqlx)?
        .rows_affected();

    Ok(rows_affected)
}

/// Most recent available books, for the chat assistant context.
pub async fn list_available_catalog(conn: &mut DbConn, limit: i64) -> Result<Vec<CatalogBook>> {
    let books = sqlx::query_as::<_, CatalogBook>(
        r#"
        SELECT b.title, b.author, b.price::FLOAT8 AS price, b.publication_year,
               c.name AS category_name
        FROM books b
        LEFT JOIN categories c ON c.id = b.category_id
        WHERE b.status = 'available'
        ORDER BY b.created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(books)
}

/// Aggregate counts and prices over the whole catalog.
pub async fn catalog_stats(conn: &mut DbConn) -> Result<CatalogStats> {
    let stats = sqlx::query_as::<_, CatalogStats>(
        r#"
        SELECT COUNT(*) AS total_books,
               COUNT(*) FILTER (WHERE status = 'available') AS available_books,
               MIN(price)::FLOAT8 AS min_price,
               AVG(price)::FLOAT8 AS avg_price,
               MAX(price)::FLOAT8 AS max_price
        FROM books
        "#,
    )
    .fetch_one(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(stats)
}
