pub mod auth;

pub use auth::{AuthenticatedUser, jwt_auth_middleware, stream_auth_middleware};
