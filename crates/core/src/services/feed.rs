//! Paginated post listings.
//!
//! Four listings share one shape: newest post first, ties broken by
//! descending ID, cut into pages by a [`Paginator`].

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use yatube_common::{AppError, AppResult};
use yatube_db::{
    entities::{group, post, user},
    repositories::{FollowRepository, GroupRepository, PostFilter, PostRepository, UserRepository},
};

use crate::services::paginator::{Page, Paginator};

/// A post together with the records it is displayed with.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    /// The post itself.
    pub post: post::Model,
    /// Its author.
    pub author: user::Model,
    /// Its group, if any.
    pub group: Option<group::Model>,
}

impl fmt::Display for PostView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self
            .post
            .text
            .chars()
            .take(post::TEXT_PREVIEW_CHARS)
            .collect();
        let group = self
            .group
            .as_ref()
            .map_or_else(|| "None".to_string(), |g| g.title.clone());
        write!(
            f,
            "{preview} {} {} {group}",
            self.post.created, self.author.username
        )
    }
}

/// Group page: the group and a page of its posts.
#[derive(Debug, Clone, Serialize)]
pub struct GroupFeed {
    /// The group.
    pub group: group::Model,
    /// Posts in the group.
    pub page: Page<PostView>,
}

/// Profile page: the author and a page of their posts.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileFeed {
    /// The author.
    pub author: user::Model,
    /// Posts by the author.
    pub page: Page<PostView>,
    /// Total posts by the author.
    pub post_count: u64,
    /// Whether the viewer follows the author. Always false for guests.
    pub following: bool,
}

/// Feed service assembling the post listings.
#[derive(Clone)]
pub struct FeedService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    group_repo: GroupRepository,
    follow_repo: FollowRepository,
    paginator: Paginator,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        group_repo: GroupRepository,
        follow_repo: FollowRepository,
        paginator: Paginator,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            group_repo,
            follow_repo,
            paginator,
        }
    }

    /// Every post.
    pub async fn global_feed(&self, page_number: u64) -> AppResult<Page<PostView>> {
        self.listing(PostFilter::All, page_number).await
    }

    /// Posts in the group with `slug`.
    pub async fn group_feed(&self, slug: &str, page_number: u64) -> AppResult<GroupFeed> {
        let group = self
            .group_repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::GroupNotFound(slug.to_string()))?;

        let page = self.listing(PostFilter::Group(group.id), page_number).await?;
        Ok(GroupFeed { group, page })
    }

    /// Posts by the user named `username`.
    pub async fn profile_feed(
        &self,
        username: &str,
        viewer: Option<&user::Model>,
        page_number: u64,
    ) -> AppResult<ProfileFeed> {
        let author = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))?;

        let page = self
            .listing(PostFilter::Author(author.id), page_number)
            .await?;

        let following = match viewer {
            Some(viewer) if viewer.id != author.id => {
                self.follow_repo.is_following(viewer.id, author.id).await?
            }
            _ => false,
        };

        Ok(ProfileFeed {
            post_count: page.total,
            author,
            page,
            following,
        })
    }

    /// Posts by authors that `viewer` follows.
    pub async fn follow_feed(
        &self,
        viewer: &user::Model,
        page_number: u64,
    ) -> AppResult<Page<PostView>> {
        self.listing(PostFilter::FollowedBy(viewer.id), page_number)
            .await
    }

    async fn listing(&self, filter: PostFilter, page_number: u64) -> AppResult<Page<PostView>> {
        let total = self.post_repo.count(filter).await?;
        let posts = if self.paginator.offset(page_number) >= total {
            vec![]
        } else {
            self.post_repo
                .find_page(
                    filter,
                    self.paginator.offset(page_number),
                    self.paginator.per_page(),
                )
                .await?
        };

        let views = self.hydrate(posts).await?;
        Ok(self.paginator.page(views, page_number, total))
    }

    /// Attach authors and groups to posts with one query per table.
    pub async fn hydrate(&self, posts: Vec<post::Model>) -> AppResult<Vec<PostView>> {
        let mut author_ids: Vec<i32> = posts.iter().map(|p| p.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let mut group_ids: Vec<i32> = posts.iter().filter_map(|p| p.group_id).collect();
        group_ids.sort_unstable();
        group_ids.dedup();

        let authors: HashMap<i32, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let groups: HashMap<i32, group::Model> = self
            .group_repo
            .find_by_ids(&group_ids)
            .await?
            .into_iter()
            .map(|g| (g.id, g))
            .collect();

        posts
            .into_iter()
            .map(|post| {
                let author = authors.get(&post.author_id).cloned().ok_or_else(|| {
                    AppError::Internal(format!("Post {} has no author", post.id))
                })?;
                let group = post.group_id.and_then(|id| groups.get(&id).cloned());
                Ok(PostView {
                    post,
                    author,
                    group,
                })
            })
            .collect()
    }
}
