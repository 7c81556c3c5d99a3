//! Application state and middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use sea_orm::DatabaseConnection;
use yatube_common::StorageBackend;
use yatube_core::{
    CommentService, FeedService, FollowService, FragmentCache, GroupService, Paginator,
    PostService, UserService,
};
use yatube_db::{
    entities::user,
    repositories::{
        CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
    },
};

use crate::response::ErrorPage;
use crate::templates::{Context, TemplateRenderer};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub feed_service: FeedService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub follow_service: FollowService,
    pub group_service: GroupService,
    pub fragment_cache: FragmentCache,
    pub renderer: Arc<dyn TemplateRenderer>,
}

impl AppState {
    /// Wire repositories and services over one database connection.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<dyn StorageBackend>,
        fragment_cache: FragmentCache,
        renderer: Arc<dyn TemplateRenderer>,
        paginator: Paginator,
    ) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let group_repo = GroupRepository::new(Arc::clone(&db));
        let post_repo = PostRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let follow_repo = FollowRepository::new(Arc::clone(&db));

        let comment_service =
            CommentService::new(comment_repo, post_repo.clone(), user_repo.clone());
        let post_service = PostService::new(
            post_repo.clone(),
            user_repo.clone(),
            group_repo.clone(),
            comment_service.clone(),
            storage,
        );
        let feed_service = FeedService::new(
            post_repo,
            user_repo.clone(),
            group_repo.clone(),
            follow_repo.clone(),
            paginator,
        );

        Self {
            user_service: UserService::new(user_repo),
            feed_service,
            post_service,
            comment_service,
            follow_service: FollowService::new(follow_repo),
            group_service: GroupService::new(group_repo),
            fragment_cache,
            renderer,
        }
    }
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the
/// request extensions. A missing or unknown token leaves the visitor a guest.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token.trim()).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => tracing::debug!("Unknown token, continuing as guest"),
            Err(e) => tracing::warn!(error = %e, "Token lookup failed, continuing as guest"),
        }
    }

    next.run(req).await
}

/// Error page middleware.
///
/// Replaces the body of 404 and 5xx responses produced by
/// [`PageError`](crate::response::PageError) with the rendered error page.
pub async fn error_page_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let viewer = req.extensions().get::<user::Model>().cloned();
    let response = next.run(req).await;

    let Some(error) = response.extensions().get::<ErrorPage>().cloned() else {
        return response;
    };
    if error.status != StatusCode::NOT_FOUND && !error.status.is_server_error() {
        return response;
    }

    let context = Context::Error {
        status: error.status.as_u16(),
        message: &error.message,
    };
    match state.renderer.render(viewer.as_ref(), &context) {
        Ok(body) => (error.status, Html(body)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render error page");
            response
        }
    }
}
