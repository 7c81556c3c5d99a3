//! Follow and unfollow endpoints.
//!
//! Both accept GET as well as POST and always land on the author's profile.

use axum::{
    Router,
    extract::{Path, State},
    http::Uri,
    routing::get,
};
use yatube_core::policy;

use crate::{
    extractors::MaybeAuthUser,
    middleware::AppState,
    response::{PageResult, authorize, redirect},
    urls,
};

/// `GET|POST /profile/{username}/follow/`
async fn profile_follow(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(username): Path<String>,
    uri: Uri,
) -> PageResult {
    let author = state.user_service.get_by_username(&username).await?;
    let decision = policy::authorize_follow(viewer.as_ref());
    let user = match authorize(decision, viewer, uri.path(), None) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    state.follow_service.follow(&user, &author).await?;
    Ok(redirect(&urls::profile(&author.username)))
}

/// `GET|POST /profile/{username}/unfollow/`
async fn profile_unfollow(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(username): Path<String>,
    uri: Uri,
) -> PageResult {
    let author = state.user_service.get_by_username(&username).await?;
    let decision = policy::authorize_unfollow(viewer.as_ref());
    let user = match authorize(decision, viewer, uri.path(), None) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    state.follow_service.unfollow(&user, &author).await?;
    Ok(redirect(&urls::profile(&author.username)))
}

/// Create the follow router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/profile/{username}/follow/",
            get(profile_follow).post(profile_follow),
        )
        .route(
            "/profile/{username}/unfollow/",
            get(profile_unfollow).post(profile_unfollow),
        )
}
