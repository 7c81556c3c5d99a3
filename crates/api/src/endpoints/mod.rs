//! Page endpoints.

mod about;
mod auth;
mod follow;
mod posts;

use axum::Router;
use yatube_common::AppError;

use crate::middleware::AppState;
use crate::response::PageError;

/// Create the page router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(posts::router())
        .merge(follow::router())
        .merge(about::router())
        .merge(auth::router())
        .fallback(not_found)
}

async fn not_found(uri: axum::http::Uri) -> PageError {
    PageError(AppError::NotFound(uri.path().to_string()))
}
