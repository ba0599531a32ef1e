pub mod books;
pub mod categories;
pub mod chat;
pub mod health;
pub mod messages;
pub mod notifications;
pub mod rentals;
pub mod users;
