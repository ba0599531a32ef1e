use crate::DbConn;
use crate::{
    error::{Error, Result},
    models::{
        books::BookStatus,
        rentals::{
            NewRental, RentBookRequest, RentalDetails, RentalFilter, RentalStatus,
            RentalTransition, ReturnBookRequest,
        },
    },
    queries::{books, rentals, users},
    validation::{collect_missing, sanitize_optional},
};
use sqlx::Connection;
use uuid::Uuid;

/// Rents an available book.
///
/// The book flips to `rented` with a conditional update inside the same
/// transaction as the rental insert, so two concurrent requests for one book
/// cannot both succeed.
pub async fn rent_book(conn: &mut DbConn, request: RentBookRequest) -> Result<RentalTransition> {
    let missing = collect_missing([
        ("book_id", request.book_id.is_none()),
        ("renter_id", request.renter_id.is_none()),
        ("rental_date", request.rental_date.is_none()),
        ("expected_return_date", request.expected_return_date.is_none()),
    ]);
    let (Some(book_id), Some(renter_id), Some(rental_date), Some(expected_return_date)) = (
        request.book_id,
        request.renter_id,
        request.rental_date,
        request.expected_return_date,
    ) else {
        return Err(Error::missing_fields(&missing));
    };

    if expected_return_date < rental_date {
        return Err(Error::validation(
            "expected_return_date",
            "Expected return date cannot be before the rental date",
        ));
    }

    if users::get_user_by_id(conn, renter_id).await?.is_none() {
        return Err(Error::NotFound(format!("User {} not found", renter_id)));
    }

    let mut tx = conn.begin().await?;

    let book = match books::mark_book_rented_if_available(&mut tx, book_id).await? {
        Some(book) => book,
        None => {
            return match books::get_book_by_id(&mut tx, book_id).await? {
                None => Err(Error::NotFound(format!("Book {} not found", book_id))),
                Some(_) => Err(Error::BadRequest("Book is not available".to_string())),
            };
        }
    };

    if book.owner_id == renter_id {
        return Err(Error::BadRequest("You cannot rent your own book".to_string()));
    }

    let rental = rentals::create_rental(
        &mut tx,
        NewRental {
            book_id,
            renter_id,
            rental_date,
            expected_return_date,
        },
    )
    .await?;

    tx.commit().await?;
    tracing::info!(rental_id = %rental.id, book_id = %book_id, renter_id = %renter_id, "Book rented");

    Ok(RentalTransition { rental, book })
}

/// Closes an active rental and makes its book available again.
pub async fn return_book(conn: &mut DbConn, request: ReturnBookRequest) -> Result<RentalTransition> {
    let missing = collect_missing([
        ("rental_id", request.rental_id.is_none()),
        ("actual_return_date", request.actual_return_date.is_none()),
    ]);
    let (Some(rental_id), Some(actual_return_date)) = (request.rental_id, request.actual_return_date) else {
        return Err(Error::missing_fields(&missing));
    };
    let comment = sanitize_optional(request.comment);

    let mut tx = conn.begin().await?;

    let rental = match rentals::close_rental_if_active(&mut tx, rental_id, actual_return_date, comment.as_deref()).await? {
        Some(rental) => rental,
        None => {
            return match rentals::get_rental_by_id(&mut tx, rental_id).await? {
                None => Err(Error::NotFound(format!("Rental {} not found", rental_id))),
                Some(_) => Err(Error::BadRequest("Rental already returned".to_string())),
            };
        }
    };

    if actual_return_date < rental.rental_date {
        return Err(Error::validation(
            "actual_return_date",
            "Return date cannot be before the rental date",
        ));
    }

    let book = books::set_book_status(&mut tx, rental.book_id, BookStatus::Available)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Book {} not found", rental.book_id)))?;

    tx.commit().await?;
    tracing::info!(rental_id = %rental.id, book_id = %book.id, "Book returned");

    Ok(RentalTransition { rental, book })
}

pub async fn list_rentals(conn: &mut DbConn, status: Option<RentalStatus>) -> Result<Vec<RentalDetails>> {
    let filter = RentalFilter {
        status,
        ..RentalFilter::default()
    };
    rentals::list_rentals(conn, &filter).await
}

pub async fn list_user_rentals(conn: &mut DbConn, renter_id: Uuid) -> Result<Vec<RentalDetails>> {
    let filter = RentalFilter {
        renter_id: Some(renter_id),
        ..RentalFilter::default()
    };
    rentals::list_rentals(conn, &filter).await
}
