pub mod books;
pub mod categories;
pub mod chat;
pub mod events;
pub mod messages;
pub mod rentals;
pub mod users;
