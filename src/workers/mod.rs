pub mod password_reset_cleanup;

pub use password_reset_cleanup::password_reset_cleanup_worker;
