//! Request extractors whose rejections are reported as [`Error`] bodies.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::Error;

/// JSON request body. Malformed or wrongly typed bodies become a 400 validation error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);

/// Path parameters, e.g. a UUID that fails to parse.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct PathParam<T>(pub T);

/// Query string parameters.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct QueryParams<T>(pub T);
