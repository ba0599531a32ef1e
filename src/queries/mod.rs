pub mod books;
pub mod categories;
pub mod messages;
pub mod password_resets;
pub mod rentals;
pub mod users;
