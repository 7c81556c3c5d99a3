//! Comment service.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;
use tracing::info;
use validator::Validate;
use yatube_common::{AppError, AppResult};
use yatube_db::{
    entities::{comment, user},
    repositories::{CommentRepository, PostRepository, UserRepository},
};

use crate::services::form::{FormErrors, FormOutcome};

/// A comment together with its author.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    /// The comment.
    pub comment: comment::Model,
    /// Its author.
    pub author: user::Model,
}

#[derive(Debug, Validate)]
struct CommentForm {
    #[validate(length(min = 1, message = "Обязательное поле."))]
    text: String,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    user_repo: UserRepository,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            user_repo,
        }
    }

    /// Add a comment to a post. Blank text is rejected without writing.
    pub async fn add(
        &self,
        author: &user::Model,
        post_id: i32,
        text: &str,
    ) -> AppResult<FormOutcome<comment::Model>> {
        let post = self.post_repo.get_by_id(post_id).await?;

        let form = CommentForm {
            text: text.trim().to_string(),
        };
        if let Err(errors) = form.validate() {
            return Ok(FormOutcome::Invalid(FormErrors::from(errors)));
        }

        let model = comment::ActiveModel {
            post_id: Set(post.id),
            author_id: Set(author.id),
            text: Set(form.text),
            created: Set(Utc::now().into()),
            ..Default::default()
        };

        let comment = self.comment_repo.create(model).await?;
        info!(
            comment_id = comment.id,
            post_id = post.id,
            author_id = author.id,
            "Comment added"
        );
        Ok(FormOutcome::Saved(comment))
    }

    /// Comments of a post with their authors, oldest first.
    pub async fn list_for_post(&self, post_id: i32) -> AppResult<Vec<CommentView>> {
        let comments = self.comment_repo.find_by_post(post_id).await?;

        let mut author_ids: Vec<i32> = comments.iter().map(|c| c.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: HashMap<i32, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        comments
            .into_iter()
            .map(|comment| {
                let author = authors.get(&comment.author_id).cloned().ok_or_else(|| {
                    AppError::Internal(format!("Comment {} has no author", comment.id))
                })?;
                Ok(CommentView { comment, author })
            })
            .collect()
    }
}
