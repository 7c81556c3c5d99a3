//! Static about pages.

use axum::{Router, extract::State, routing::get};

use crate::{
    extractors::MaybeAuthUser,
    middleware::AppState,
    response::{PageResult, page},
    templates::Context,
};

async fn author(State(state): State<AppState>, MaybeAuthUser(viewer): MaybeAuthUser) -> PageResult {
    let body = state.renderer.render(viewer.as_ref(), &Context::AboutAuthor)?;
    Ok(page(body))
}

async fn tech(State(state): State<AppState>, MaybeAuthUser(viewer): MaybeAuthUser) -> PageResult {
    let body = state.renderer.render(viewer.as_ref(), &Context::AboutTech)?;
    Ok(page(body))
}

/// Create the about router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/about/author/", get(author))
        .route("/about/tech/", get(tech))
}
