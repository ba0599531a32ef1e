//! Input validation utilities for the service layer.
//!
//! Request bodies deserialize into all-optional DTOs so that a missing field
//! surfaces as a `VALIDATION_ERROR` naming it, rather than a framework rejection.

use crate::error::{Error, Result};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Largest price a `NUMERIC(10,2)` column holds.
pub const MAX_PRICE: f64 = 99_999_999.99;

/// Column widths of the text fields users can write.
pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_AUTHOR_LENGTH: usize = 255;
pub const MAX_SUBJECT_LENGTH: usize = 255;
pub const MAX_NAME_LENGTH: usize = 100;

/// Validates email format using structural checks
///
/// # Examples
/// ```
/// use bookineo::validation::validate_email;
///
/// validate_email("user@example.com").unwrap();
/// assert!(validate_email("invalid-email").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(Error::validation("email", "Email cannot be empty"));
    }

    if email.len() > 254 {
        return Err(Error::validation("email", "Email address is too long (max 254 characters)"));
    }

    let Some((local_part, domain)) = email.split_once('@') else {
        return Err(Error::validation("email", "Invalid email format: must contain @ symbol"));
    };

    if local_part.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(Error::validation(
            "email",
            "Invalid email format: must contain exactly one @ symbol not at start or end",
        ));
    }

    if local_part.len() > 64 {
        return Err(Error::validation("email", "Invalid email format: local part is too long (max 64 characters)"));
    }

    if !domain.contains('.') {
        return Err(Error::validation("email", "Invalid email format: domain must contain at least one dot"));
    }

    if email.contains("..") {
        return Err(Error::validation("email", "Invalid email format: cannot contain consecutive dots"));
    }

    let invalid_chars = ['<', '>', '(', ')', '[', ']', '\\', ',', ';', ':', '"', ' '];
    if let Some(c) = invalid_chars.iter().find(|c| email.contains(**c)) {
        return Err(Error::validation("email", format!("Invalid email format: cannot contain '{}'", c)));
    }

    Ok(())
}

/// Validates password length.
pub fn validate_password(password: &str) -> Result<()> {
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(Error::validation(
            "password",
            format!("Password must be at least {} characters long", MIN_PASSWORD_LENGTH),
        ));
    }

    if length > 128 {
        return Err(Error::validation("password", "Password is too long (max 128 characters)"));
    }

    Ok(())
}

/// Validates a book price: finite, not negative and storable.
pub fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::validation("price", "Price must be a positive number"));
    }
    if price > MAX_PRICE {
        return Err(Error::validation(
            "price",
            format!("Price cannot exceed {:.2}", MAX_PRICE),
        ));
    }
    Ok(())
}

/// Rejects text longer than `max` characters.
pub fn validate_length(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::validation(
            field,
            format!("{} is too long (max {} characters)", field, max),
        ));
    }
    Ok(())
}

/// Trims optional text input; blank strings count as absent.
pub fn sanitize_optional(input: Option<String>) -> Option<String> {
    input
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Names of the required fields whose check reports them absent.
///
/// ```
/// use bookineo::validation::collect_missing;
///
/// let missing = collect_missing([("title", true), ("author", false)]);
/// assert_eq!(missing, vec!["title"]);
/// ```
pub fn collect_missing<const N: usize>(checks: [(&'static str, bool); N]) -> Vec<&'static str> {
    checks
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect()
}
