use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RentalStatus {
    Active,
    Returned,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rental {
    pub id: Uuid,
    pub book_id: Uuid,
    pub renter_id: Uuid,
    pub rental_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub status: RentalStatus,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A rental joined with its book and renter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RentalDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub rental: Rental,
    pub book_title: String,
    pub book_author: String,
    pub renter_email: String,
    pub renter_first_name: Option<String>,
    pub renter_last_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewRental {
    pub book_id: Uuid,
    pub renter_id: Uuid,
    pub rental_date: NaiveDate,
    pub expected_return_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RentBookRequest {
    pub book_id: Option<Uuid>,
    pub renter_id: Option<Uuid>,
    pub rental_date: Option<NaiveDate>,
    pub expected_return_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReturnBookRequest {
    pub rental_id: Option<Uuid>,
    pub actual_return_date: Option<NaiveDate>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RentalFilter {
    pub status: Option<RentalStatus>,
    pub renter_id: Option<Uuid>,
    pub book_id: Option<Uuid>,
}

/// Outcome of a successful rent or return: the rental plus the mirrored book.
#[derive(Debug, Clone, Serialize)]
pub struct RentalTransition {
    pub rental: Rental,
    pub book: super::books::Book,
}
