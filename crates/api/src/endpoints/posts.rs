//! Post pages: feeds, detail, create, edit and comments.

use axum::{
    Form, Router,
    extract::{Multipart, Path, Query, State, multipart::MultipartRejection, rejection::FormRejection},
    http::Uri,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::debug;
use yatube_common::{AppError, AppResult};
use yatube_core::{
    FormOutcome, INDEX_PAGE_FRAGMENT, ImageUpload, PostInput, Rendered,
    policy::{self, Decision},
};
use yatube_db::entities::{post as post_entity, user};

use crate::{
    extractors::{MaybeAuthUser, PageQuery},
    middleware::AppState,
    response::{PageError, PageResult, authorize, page, redirect},
    templates::{Context, PostFormView},
    urls,
};

/// Comment form body.
#[derive(Debug, Default, Deserialize)]
pub struct CommentForm {
    /// Comment text.
    #[serde(default)]
    pub text: String,
}

/// Parse a post ID path segment. Anything but an integer is a 404.
fn parse_post_id(raw: &str) -> Result<i32, PageError> {
    raw.parse()
        .map_err(|_| PageError(AppError::NotFound(format!("/posts/{raw}/"))))
}

/// Read a multipart post form.
async fn read_post_form(mut multipart: Multipart) -> AppResult<PostInput> {
    let mut input = PostInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => {
                input.text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "group" => {
                input.group = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !data.is_empty() {
                    input.image = Some(ImageUpload {
                        file_name,
                        data: data.to_vec(),
                    });
                }
            }
            other => debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    Ok(input)
}

/// `GET /`
async fn index(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let number = query.number();
    let page_key = number.to_string();
    let fragment = state
        .fragment_cache
        .get_or_render(INDEX_PAGE_FRAGMENT, &[&page_key], || async {
            let posts = state.feed_service.global_feed(number).await?;
            let html = state.renderer.render_index_fragment(&posts)?;
            // Pages past the end are not cached
            if posts.number > posts.num_pages {
                Ok(Rendered::transient(html))
            } else {
                Ok(Rendered::cacheable(html))
            }
        })
        .await?;

    let body = state.renderer.render(
        viewer.as_ref(),
        &Context::Index {
            fragment: &fragment,
        },
    )?;
    Ok(page(body))
}

/// `GET /group/{slug}/`
async fn group_list(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let feed = state.feed_service.group_feed(&slug, query.number()).await?;
    let body = state
        .renderer
        .render(viewer.as_ref(), &Context::GroupList { feed: &feed })?;
    Ok(page(body))
}

/// `GET /profile/{username}/`
async fn profile(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let feed = state
        .feed_service
        .profile_feed(&username, viewer.as_ref(), query.number())
        .await?;
    let show_follow = viewer.as_ref().is_some_and(|v| v.id != feed.author.id);

    let body = state.renderer.render(
        viewer.as_ref(),
        &Context::Profile {
            feed: &feed,
            show_follow,
        },
    )?;
    Ok(page(body))
}

/// `GET /posts/{id}/`
async fn post_detail(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(raw_id): Path<String>,
) -> PageResult {
    let post_id = parse_post_id(&raw_id)?;
    let detail = state.post_service.get_detail(post_id).await?;

    let can_edit =
        policy::authorize_edit_post(viewer.as_ref(), &detail.view.post) == Decision::Allow;
    let can_comment =
        policy::authorize_add_comment(viewer.as_ref(), &detail.view.post) == Decision::Allow;

    let body = state.renderer.render(
        viewer.as_ref(),
        &Context::PostDetail {
            detail: &detail,
            can_edit,
            can_comment,
        },
    )?;
    Ok(page(body))
}

async fn render_form(
    state: &AppState,
    viewer: Option<&user::Model>,
    form: &PostFormView,
) -> PageResult {
    let groups = state.group_service.list().await?;
    let body = state.renderer.render(
        viewer,
        &Context::PostForm {
            form,
            groups: &groups,
        },
    )?;
    Ok(page(body))
}

fn form_for_post(post: &post_entity::Model) -> PostFormView {
    PostFormView {
        post_id: Some(post.id),
        text: post.text.clone(),
        group: post.group_id.map(|id| id.to_string()),
        image: post.image.clone(),
        ..Default::default()
    }
}

/// `GET /create/`
async fn create_form(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    uri: Uri,
) -> PageResult {
    let decision = policy::authorize_create_post(viewer.as_ref());
    let author = match authorize(decision, viewer, uri.path(), None) {
        Ok(author) => author,
        Err(redirect) => return Ok(redirect),
    };
    render_form(&state, Some(&author), &PostFormView::default()).await
}

/// `POST /create/`
async fn create_submit(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    uri: Uri,
    multipart: Result<Multipart, MultipartRejection>,
) -> PageResult {
    let decision = policy::authorize_create_post(viewer.as_ref());
    let author = match authorize(decision, viewer, uri.path(), None) {
        Ok(author) => author,
        Err(redirect) => return Ok(redirect),
    };

    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let input = read_post_form(multipart).await?;
    let submitted_text = input.text.clone();
    let submitted_group = input.group.clone();

    match state.post_service.create(&author, input).await? {
        FormOutcome::Saved(_) => Ok(redirect(&urls::profile(&author.username))),
        FormOutcome::Invalid(errors) => {
            let form = PostFormView {
                post_id: None,
                text: submitted_text,
                group: submitted_group,
                image: None,
                errors,
            };
            render_form(&state, Some(&author), &form).await
        }
    }
}

/// `GET /posts/{id}/edit/`
async fn edit_form(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(raw_id): Path<String>,
    uri: Uri,
) -> PageResult {
    let post = state.post_service.get(parse_post_id(&raw_id)?).await?;
    let decision = policy::authorize_edit_post(viewer.as_ref(), &post);
    let editor = match authorize(decision, viewer, uri.path(), Some(post.id)) {
        Ok(editor) => editor,
        Err(redirect) => return Ok(redirect),
    };
    render_form(&state, Some(&editor), &form_for_post(&post)).await
}

/// `POST /posts/{id}/edit/`
async fn edit_submit(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(raw_id): Path<String>,
    uri: Uri,
    multipart: Result<Multipart, MultipartRejection>,
) -> PageResult {
    let post = state.post_service.get(parse_post_id(&raw_id)?).await?;
    let decision = policy::authorize_edit_post(viewer.as_ref(), &post);
    let editor = match authorize(decision, viewer, uri.path(), Some(post.id)) {
        Ok(editor) => editor,
        Err(redirect) => return Ok(redirect),
    };

    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let input = read_post_form(multipart).await?;
    let submitted_text = input.text.clone();
    let submitted_group = input.group.clone();

    match state.post_service.edit(&editor, post.id, input).await {
        Ok(FormOutcome::Saved(saved)) => Ok(redirect(&urls::post_detail(saved.id))),
        Ok(FormOutcome::Invalid(errors)) => {
            let form = PostFormView {
                post_id: Some(post.id),
                text: submitted_text,
                group: submitted_group,
                image: post.image.clone(),
                errors,
            };
            render_form(&state, Some(&editor), &form).await
        }
        Err(AppError::Forbidden(_)) => Ok(redirect(&urls::post_detail(post.id))),
        Err(e) => Err(e.into()),
    }
}

/// `POST /posts/{id}/comment`
async fn add_comment(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(raw_id): Path<String>,
    uri: Uri,
    form: Result<Form<CommentForm>, FormRejection>,
) -> PageResult {
    let post = state.post_service.get(parse_post_id(&raw_id)?).await?;
    let decision = policy::authorize_add_comment(viewer.as_ref(), &post);
    let author = match authorize(decision, viewer, uri.path(), Some(post.id)) {
        Ok(author) => author,
        Err(redirect) => return Ok(redirect),
    };

    let text = form.map(|Form(form)| form.text).unwrap_or_default();
    if let FormOutcome::Invalid(errors) = state.comment_service.add(&author, post.id, &text).await? {
        debug!(post_id = post.id, ?errors, "Comment rejected");
    }

    Ok(redirect(&urls::post_detail(post.id)))
}

/// `GET /follow/`
async fn follow_index(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(query): Query<PageQuery>,
    uri: Uri,
) -> PageResult {
    let decision = policy::authorize_view_follow_feed(viewer.as_ref());
    let reader = match authorize(decision, viewer, uri.path(), None) {
        Ok(reader) => reader,
        Err(redirect) => return Ok(redirect),
    };

    let posts = state.feed_service.follow_feed(&reader, query.number()).await?;
    let body = state
        .renderer
        .render(Some(&reader), &Context::Follow { page: &posts })?;
    Ok(page(body))
}

/// Create the post pages router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/group/{slug}/", get(group_list))
        .route("/profile/{username}/", get(profile))
        .route("/posts/{post_id}/", get(post_detail))
        .route("/create/", get(create_form).post(create_submit))
        .route("/posts/{post_id}/edit/", get(edit_form).post(edit_submit))
        .route("/posts/{post_id}/comment", post(add_comment))
        .route("/follow/", get(follow_index))
}
