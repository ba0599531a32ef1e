pub mod books;
pub mod categories;
pub mod chat;
pub mod email;
pub mod jwt;
pub mod messages;
pub mod notifier;
pub mod rentals;
pub mod users;
