//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, follow, post};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
    sea_query::{Expr, Query},
};
use yatube_common::{AppError, AppResult};

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    /// Every post.
    All,
    /// Posts in one group.
    Group(i32),
    /// Posts written by one user.
    Author(i32),
    /// Posts written by authors the given user follows.
    FollowedBy(i32),
}

impl PostFilter {
    fn apply(self, query: Select<Post>) -> Select<Post> {
        match self {
            Self::All => query,
            Self::Group(group_id) => query.filter(post::Column::GroupId.eq(group_id)),
            Self::Author(author_id) => query.filter(post::Column::AuthorId.eq(author_id)),
            Self::FollowedBy(user_id) => query.filter(
                post::Column::AuthorId.in_subquery(
                    Query::select()
                        .column(follow::Column::AuthorId)
                        .from(follow::Entity)
                        .and_where(Expr::col(follow::Column::UserId).eq(user_id))
                        .to_owned(),
                ),
            ),
        }
    }
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i32) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or(AppError::PostNotFound(id))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the posts a listing covers.
    pub async fn count(&self, filter: PostFilter) -> AppResult<u64> {
        filter
            .apply(Post::find())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get one page of a listing, newest first.
    ///
    /// Ties on `created` are broken by descending ID so pages never overlap.
    pub async fn find_page(
        &self,
        filter: PostFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<post::Model>> {
        filter
            .apply(Post::find())
            .order_by_desc(post::Column::Created)
            .order_by_desc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count posts written by a user.
    pub async fn count_by_author(&self, author_id: i32) -> AppResult<u64> {
        self.count(PostFilter::Author(author_id)).await
    }
}
