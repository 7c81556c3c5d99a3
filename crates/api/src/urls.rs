//! Path builders for every named route.
//!
//! Handlers and templates build links through these functions so the
//! route table in [`crate::endpoints`] is the only other place paths appear.

/// `/`
#[must_use]
pub fn index() -> String {
    "/".to_string()
}

/// `/group/{slug}/`
#[must_use]
pub fn group_list(slug: &str) -> String {
    format!("/group/{}/", urlencoding::encode(slug))
}

/// `/profile/{username}/`
#[must_use]
pub fn profile(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

/// `/posts/{id}/`
#[must_use]
pub fn post_detail(post_id: i32) -> String {
    format!("/posts/{post_id}/")
}

/// `/create/`
#[must_use]
pub fn post_create() -> String {
    "/create/".to_string()
}

/// `/posts/{id}/edit/`
#[must_use]
pub fn post_edit(post_id: i32) -> String {
    format!("/posts/{post_id}/edit/")
}

/// `/posts/{id}/comment`
#[must_use]
pub fn add_comment(post_id: i32) -> String {
    format!("/posts/{post_id}/comment")
}

/// `/follow/`
#[must_use]
pub fn follow_index() -> String {
    "/follow/".to_string()
}

/// `/profile/{username}/follow/`
#[must_use]
pub fn profile_follow(username: &str) -> String {
    format!("{}follow/", profile(username))
}

/// `/profile/{username}/unfollow/`
#[must_use]
pub fn profile_unfollow(username: &str) -> String {
    format!("{}unfollow/", profile(username))
}

/// `/about/author/`
#[must_use]
pub fn about_author() -> String {
    "/about/author/".to_string()
}

/// `/about/tech/`
#[must_use]
pub fn about_tech() -> String {
    "/about/tech/".to_string()
}

/// `/auth/login/`
#[must_use]
pub fn login() -> String {
    "/auth/login/".to_string()
}

/// `/auth/login/?next=<path>`, with the path percent-encoded except for `/`.
#[must_use]
pub fn login_with_next(next: &str) -> String {
    format!(
        "{}?next={}",
        login(),
        urlencoding::encode(next).replace("%2F", "/")
    )
}

/// A page of a paginated listing: `{path}?page={number}`.
#[must_use]
pub fn with_page(path: &str, number: u64) -> String {
    format!("{path}?page={number}")
}
