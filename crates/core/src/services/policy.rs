//! Access decisions for posts, comments and follows.
//!
//! Every function here is pure: it looks only at the viewer and the target
//! record and never touches storage. Existence checks happen before a
//! decision is asked for, so an unknown post is a 404 no matter who asks.
//!
//! The viewer is `None` for a guest.

use yatube_db::entities::{post, user};

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Proceed with the action.
    Allow,
    /// The viewer must log in first.
    RedirectToLogin,
    /// The viewer is logged in but may not act; send them to the post.
    RedirectToDetail,
}

impl Decision {
    /// Whether the action may proceed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

const fn require_login(viewer: Option<&user::Model>) -> Decision {
    match viewer {
        Some(_) => Decision::Allow,
        None => Decision::RedirectToLogin,
    }
}

/// Any logged-in user may create a post.
#[must_use]
pub const fn authorize_create_post(viewer: Option<&user::Model>) -> Decision {
    require_login(viewer)
}

/// Only the author may edit a post.
#[must_use]
pub fn authorize_edit_post(viewer: Option<&user::Model>, post: &post::Model) -> Decision {
    match viewer {
        None => Decision::RedirectToLogin,
        Some(user) if user.id == post.author_id => Decision::Allow,
        Some(_) => Decision::RedirectToDetail,
    }
}

/// Any logged-in user may comment on any post.
#[must_use]
pub const fn authorize_add_comment(viewer: Option<&user::Model>, _post: &post::Model) -> Decision {
    require_login(viewer)
}

/// Any logged-in user may follow. Self-follow is handled by the follow service.
#[must_use]
pub const fn authorize_follow(viewer: Option<&user::Model>) -> Decision {
    require_login(viewer)
}

/// Any logged-in user may unfollow.
#[must_use]
pub const fn authorize_unfollow(viewer: Option<&user::Model>) -> Decision {
    require_login(viewer)
}

/// The follow feed is personal and needs a login.
#[must_use]
pub const fn authorize_view_follow_feed(viewer: Option<&user::Model>) -> Decision {
    require_login(viewer)
}
