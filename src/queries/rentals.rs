use crate::{
    error::{Error, Result},
    models::rentals::{NewRental, Rental, RentalDetails, RentalFilter},
};
use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::DbConn;

const RENTAL_COLUMNS: &str = "r.id, r.book_id, r.renter_id, r.rental_date, r.expected_return_date, \
     r.actual_return_date, r.status, r.comment, r.created_at, r.updated_at";

/// Builds the listing query for rentals joined with book and renter.
pub fn rental_list_query(filter: &RentalFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {RENTAL_COLUMNS}, b.title AS book_title, b.author AS book_author, \
         u.email AS renter_email, u.first_name AS renter_first_name, u.last_name AS renter_last_name \
         FROM rentals r \
         JOIN books b ON b.id = r.book_id \
         JOIN users u ON u.id = r.renter_id \
         WHERE 1 = 1"
    ));
    if let Some(status) = filter.status {
        builder.push(" AND r.status = ").push_bind(status);
    }
    if let Some(renter_id) = filter.renter_id {
        builder.push(" AND r.renter_id = ").push_bind(renter_id);
    }
    if let Some(book_id) = filter.book_id {
        builder.push(" AND r.book_id = ").push_bind(book_id);
    }
    builder.push(" ORDER BY r.rental_date DESC, r.created_at DESC");
    builder
}

/// Inserts an active rental. A second active rental for the same book
/// violates the partial unique index and is reported as "not available".
pub async fn create_rental(conn: &mut DbConn, new_rental: NewRental) -> Result<Rental> {
    let rental = sqlx::query_as::<_, Rental>(&format!(
        r#"
        INSERT INTO rentals AS r (book_id, renter_id, rental_date, expected_return_date, status)
        VALUES ($1, $2, $3, $4, 'active')
        RETURNING {RENTAL_COLUMNS}
        "#
    ))
    .bind(new_rental.book_id)
    .bind(new_rental.renter_id)
    .bind(new_rental.rental_date)
    .bind(new_rental.expected_return_date)
    .fetch_one(conn)
    .await
    .map_err(|e| match e.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            Error::BadRequest("Book is not available".to_string())
        }
        // The renter was deleted while the rental was being created
        Some(db_err) if db_err.is_foreign_key_violation() => {
            Error::NotFound(format!("User {} not found", new_rental.renter_id))
        }
        _ => Error::Sqlx(e),
    })?;

    Ok(rental)
}

/// Gets a single rental by ID. The rental may not exist.
pub async fn get_rental_by_id(conn: &mut DbConn, id: Uuid) -> Result<Option<Rental>> {
    let rental = sqlx::query_as::<_, Rental>(&format!(
        "SELECT {RENTAL_COLUMNS} FROM rentals r WHERE r.id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(rental)
}

/// Closes an active rental. Returns `None` when the rental is missing or
/// already returned.
pub async fn close_rental_if_active(
    conn: &mut DbConn,
    id: Uuid,
    actual_return_date: NaiveDate,
    comment: Option<&str>,
) -> Result<Option<Rental>> {
    let rental = sqlx::query_as::<_, Rental>(&format!(
        r#"
        UPDATE rentals AS r
        SET status = 'returned',
            actual_return_date = $1,
            comment = $2,
            updated_at = now()
        WHERE r.id = $3 AND r.status = 'active'
        RETURNING {RENTAL_COLUMNS}
        "#
    ))
    .bind(actual_return_date)
    .bind(comment)
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(rental)
}

/// Lists rentals matching the filter, most recent first.
pub async fn list_rentals(conn: &mut DbConn, filter: &RentalFilter) -> Result<Vec<RentalDetails>> {
    let mut builder = rental_list_query(filter);
    let rentals = builder
        .build_query_as::<RentalDetails>()
        .fetch_all(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(rentals)
}
