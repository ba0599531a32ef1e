use axum::{
    Json, Router,
    http::{HeaderValue, Method, StatusCode, Uri, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use std::any::Any;
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::CorsConfig,
    handlers::{books, categories, chat, health, messages, notifications, rentals, users},
    middleware::{jwt_auth_middleware, stream_auth_middleware},
    state::AppState,
};

/// Builds the whole HTTP surface under `/api`.
///
/// Routes behind a bearer token get [`jwt_auth_middleware`] through
/// `route_layer`; the notification stream uses [`stream_auth_middleware`].
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        // Users
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/forgot-password", post(users::forgot_password))
        .route("/users/reset-password", post(users::reset_password))
        // Categories
        .route(
            "/categories",
            post(categories::create_category).get(categories::list_categories),
        )
        .route(
            "/categories/{id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        // Books
        .route("/books", post(books::create_book).get(books::list_books))
        .route(
            "/books/{id}",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Rentals
        .route("/rentals/rent", post(rentals::rent_book))
        .route("/rentals/return", post(rentals::return_book))
        .route("/rentals", get(rentals::list_rentals))
        .route("/rentals/user/{id}", get(rentals::list_user_rentals))
        // Chat assistant
        .route("/chat", post(chat::chat))
        .route("/chat/status", get(chat::chat_status));

    let protected_routes = Router::new()
        .route(
            "/users/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/users", delete(users::delete_account))
        .route("/messages", post(messages::send_message))
        .route("/messages/user/{user_id}", get(messages::list_user_messages))
        .route(
            "/messages/user/{user_id}/unread/count",
            get(messages::unread_count),
        )
        .route(
            "/messages/{id}",
            get(messages::get_message).delete(messages::delete_message),
        )
        .route(
            "/messages/{id}/read",
            put(messages::mark_as_read).patch(messages::mark_as_read),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    let stream_routes = Router::new()
        .route(
            "/notifications/stream",
            get(notifications::notification_stream),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            stream_auth_middleware,
        ));

    let api_routes = public_routes.merge(protected_routes).merge(stream_routes);

    Router::new()
        .nest("/api", api_routes)
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer(&state.config.cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let allow_origin = match config.origins() {
        None => AllowOrigin::from(AnyOrigin),
        Some(origins) => AllowOrigin::list(
            origins
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                        None
                    }
                }),
        ),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

async fn route_not_found(uri: Uri) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "Route not found",
            "path": uri.path()
        })),
    )
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": "Internal server error",
            "code": "INTERNAL_ERROR"
        })),
    )
        .into_response()
}
