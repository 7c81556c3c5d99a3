//! Follow service.

use tracing::{debug, info};
use yatube_common::AppResult;
use yatube_db::{entities::user, repositories::FollowRepository};

/// Result of a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowResult {
    /// A new follow edge was stored.
    Followed,
    /// The edge already existed; nothing changed.
    AlreadyFollowing,
    /// The user tried to follow themselves; nothing changed.
    SelfFollowIgnored,
}

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository) -> Self {
        Self { follow_repo }
    }

    /// Follow `author`. Repeated calls are no-ops.
    pub async fn follow(&self, user: &user::Model, author: &user::Model) -> AppResult<FollowResult> {
        if user.id == author.id {
            debug!(user_id = user.id, "Ignoring self-follow");
            return Ok(FollowResult::SelfFollowIgnored);
        }

        if self.follow_repo.create_if_absent(user.id, author.id).await? {
            info!(user_id = user.id, author_id = author.id, "Followed author");
            Ok(FollowResult::Followed)
        } else {
            Ok(FollowResult::AlreadyFollowing)
        }
    }

    /// Stop following `author`. Returns whether an edge was removed.
    pub async fn unfollow(&self, user: &user::Model, author: &user::Model) -> AppResult<bool> {
        let removed = self.follow_repo.delete_by_pair(user.id, author.id).await?;
        if removed {
            info!(user_id = user.id, author_id = author.id, "Unfollowed author");
        }
        Ok(removed)
    }

    /// Check whether `user` follows `author`.
    pub async fn is_following(&self, user: &user::Model, author: &user::Model) -> AppResult<bool> {
        self.follow_repo.is_following(user.id, author.id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use yatube_db::repositories::{PostFilter, PostRepository};
    use yatube_db::test_utils::{create_post, create_user, setup_sqlite};

    #[tokio::test]
    async fn test_follow_round_trip() {
        let db = setup_sqlite().await.unwrap();
        let author = create_user(&db, "TestAuthor").await.unwrap();
        let reader = create_user(&db, "TestUser").await.unwrap();
        create_post(&db, &author, None, "1й текст").await.unwrap();

        let follows = FollowService::new(FollowRepository::new(db.clone()));
        let posts = PostRepository::new(db.clone());

        assert_eq!(
            follows.follow(&reader, &author).await.unwrap(),
            FollowResult::Followed
        );
        assert!(follows.is_following(&reader, &author).await.unwrap());
        assert_eq!(
            posts.count(PostFilter::FollowedBy(reader.id)).await.unwrap(),
            1
        );

        assert!(follows.unfollow(&reader, &author).await.unwrap());
        assert!(!follows.is_following(&reader, &author).await.unwrap());
        assert_eq!(
            posts.count(PostFilter::FollowedBy(reader.id)).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_follow_is_idempotent() {
        let db = setup_sqlite().await.unwrap();
        let author = create_user(&db, "TestAuthor").await.unwrap();
        let reader = create_user(&db, "TestUser").await.unwrap();

        let follows = FollowService::new(FollowRepository::new(db));

        follows.follow(&reader, &author).await.unwrap();
        assert_eq!(
            follows.follow(&reader, &author).await.unwrap(),
            FollowResult::AlreadyFollowing
        );

        assert!(follows.unfollow(&reader, &author).await.unwrap());
        assert!(!follows.unfollow(&reader, &author).await.unwrap());
    }

    #[tokio::test]
    async fn test_self_follow_ignored() {
        let db = setup_sqlite().await.unwrap();
        let author = create_user(&db, "TestAuthor").await.unwrap();

        let follows = FollowService::new(FollowRepository::new(db));

        assert_eq!(
            follows.follow(&author, &author).await.unwrap(),
            FollowResult::SelfFollowIgnored
        );
        assert!(!follows.is_following(&author, &author).await.unwrap());
    }
}
