use crate::{DbConn, DbPool};
use crate::{
    error::{Error, Result},
    models::books::{
        Book, BookListQuery, BookListing, BookPage, BookStatus, CreateBookRequest, NewBook,
        Pagination, UpdateBook,
    },
    queries::{books, categories, users},
    validation::{
        MAX_AUTHOR_LENGTH, MAX_TITLE_LENGTH, collect_missing, sanitize_optional, validate_length,
        validate_price,
    },
};
use uuid::Uuid;

fn book_not_found(id: Uuid) -> Error {
    Error::NotFound(format!("Book {} not found", id))
}

async fn ensure_category_exists(conn: &mut DbConn, category_id: Option<Uuid>) -> Result<()> {
    if let Some(category_id) = category_id {
        if categories::get_category_by_id(conn, category_id).await?.is_none() {
            return Err(Error::NotFound(format!("Category {} not found", category_id)));
        }
    }
    Ok(())
}

/// `rented` is only ever set by the rental lifecycle.
fn ensure_settable_status(status: Option<BookStatus>) -> Result<()> {
    if status == Some(BookStatus::Rented) {
        return Err(Error::BadRequest(
            "Book status 'rented' is set by renting the book".to_string(),
        ));
    }
    Ok(())
}

/// Lists one page of books. The page and the total count are read
/// concurrently on two pooled connections.
pub async fn list_books(pool: &DbPool, query: BookListQuery) -> Result<BookPage> {
    let (filter, page) = query.into_parts();

    let (books, total_books) = tokio::try_join!(
        async {
            let mut conn = pool.acquire().await?;
            books::list_books(&mut conn, &filter, page).await
        },
        async {
            let mut conn = pool.acquire().await?;
            books::count_books(&mut conn, &filter).await
        },
    )?;

    Ok(BookPage {
        books,
        pagination: Pagination::new(page, total_books),
    })
}

pub async fn create_book(conn: &mut DbConn, request: CreateBookRequest) -> Result<Book> {
    let title = sanitize_optional(request.title);
    let author = sanitize_optional(request.author);

    let missing = collect_missing([
        ("title", title.is_none()),
        ("author", author.is_none()),
        ("price", request.price.is_none()),
        ("owner_id", request.owner_id.is_none()),
    ]);
    let (Some(title), Some(author), Some(price), Some(owner_id)) =
        (title, author, request.price, request.owner_id)
    else {
        return Err(Error::missing_fields(&missing));
    };
    validate_length("title", &title, MAX_TITLE_LENGTH)?;
    validate_length("author", &author, MAX_AUTHOR_LENGTH)?;
    validate_price(price)?;
    ensure_settable_status(request.status)?;

    if users::get_user_by_id(conn, owner_id).await?.is_none() {
        return Err(Error::NotFound(format!("User {} not found", owner_id)));
    }
    ensure_category_exists(conn, request.category_id).await?;

    let new_book = NewBook {
        title,
        author,
        publication_year: request.publication_year,
        category_id: request.category_id,
        price,
        owner_id,
        image_url: sanitize_optional(request.image_url),
        status: request.status.unwrap_or(BookStatus::Available),
    };

    let book = books::create_book(conn, new_book).await?;
    tracing::info!(book_id = %book.id, owner_id = %book.owner_id, "Book created");
    Ok(book)
}

pub async fn get_book(conn: &mut DbConn, id: Uuid) -> Result<BookListing> {
    books::get_book_listing_by_id(conn, id)
        .await?
        .ok_or_else(|| book_not_found(id))
}

/// Partial update; absent fields keep their stored value.
pub async fn update_book(conn: &mut DbConn, id: Uuid, mut update: UpdateBook) -> Result<Book> {
    update.title = sanitize_optional(update.title);
    update.author = sanitize_optional(update.author);
    update.image_url = sanitize_optional(update.image_url);
    if let Some(title) = &update.title {
        validate_length("title", title, MAX_TITLE_LENGTH)?;
    }
    if let Some(author) = &update.author {
        validate_length("author", author, MAX_AUTHOR_LENGTH)?;
    }
    if let Some(price) = update.price {
        validate_price(price)?;
    }
    ensure_settable_status(update.status)?;
    ensure_category_exists(conn, update.category_id).await?;

    if update.status.is_some() && books::has_active_rental(conn, id).await? {
        return Err(Error::BadRequest(
            "Cannot change the status of a book that is currently rented".to_string(),
        ));
    }

    books::update_book(conn, id, update)
        .await?
        .ok_or_else(|| book_not_found(id))
}

/// Deletes a book unless it is currently rented.
pub async fn delete_book(conn: &mut DbConn, id: Uuid) -> Result<()> {
    if books::get_book_by_id(conn, id).await?.is_none() {
        return Err(book_not_found(id));
    }
    if books::has_active_rental(conn, id).await? {
        return Err(Error::BadRequest(
            "Cannot delete a book that is currently rented".to_string(),
        ));
    }

    if books::delete_book(conn, id).await? == 0 {
        return Err(book_not_found(id));
    }
    tracing::info!(book_id = %id, "Book deleted");
    Ok(())
}
