//! HTTP layer for yatube.
//!
//! This crate serves the HTML site:
//!
//! - **Endpoints**: feeds, post pages, forms, follow actions, static pages
//! - **Extractors**: optional viewer, page number
//! - **Middleware**: bearer-token authentication, error pages
//! - **Templates**: the [`TemplateRenderer`] capability and its HTML implementation
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod templates;
pub mod urls;

use std::path::Path;

use axum::{Router, extract::DefaultBodyLimit};
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer};

pub use endpoints::router;
pub use middleware::AppState;
pub use templates::{HtmlRenderer, TemplateRenderer};

/// Largest accepted request body, uploads included.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build the complete application: pages, uploaded media and middleware.
pub fn app(state: AppState, media_root: impl AsRef<Path>, media_url: &str) -> Router {
    let media_url = format!("/{}", media_url.trim_matches('/'));

    router()
        .nest_service(&media_url, ServeDir::new(media_root.as_ref()))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::error_page_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
