//! Login page.
//!
//! Visitors authenticate with a bearer token; this page only tells a
//! redirected guest where they were headed.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use crate::{
    extractors::MaybeAuthUser,
    middleware::AppState,
    response::{PageResult, page},
    templates::Context,
};

/// Login query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// Path to return to after logging in.
    pub next: Option<String>,
}

async fn login(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(query): Query<LoginQuery>,
) -> PageResult {
    let body = state.renderer.render(
        viewer.as_ref(),
        &Context::Login {
            next: query.next.as_deref(),
        },
    )?;
    Ok(page(body))
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new().route("/auth/login/", get(login))
}
