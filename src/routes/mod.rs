use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod articles;
pub mod auth;
pub mod chat;
pub mod comments;
pub mod interactions;
pub mod media;
pub mod notifications;

/// Assemble the full application router.
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();
    Router::new()
        .merge(auth::router())
        .merge(articles::router())
        .merge(comments::router())
        .merge(interactions::router())
        .merge(notifications::router())
        .merge(chat::router())
        .merge(media::router())
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .with_state(state)
}
