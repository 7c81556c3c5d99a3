//! HTML page rendering.
//!
//! Handlers describe a page as a [`Context`] and hand it to a
//! [`TemplateRenderer`]. Every page marks the template that produced it on
//! the `<body>` element as `data-template="posts/index.html"`.

#![allow(missing_docs)]

use std::fmt::Write as _;

use yatube_common::AppResult;
use yatube_core::{FormErrors, GroupFeed, Page, PostDetail, PostView, ProfileFeed};
use yatube_db::entities::{group, user};

use crate::urls;

/// Page templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Index,
    GroupList,
    Profile,
    PostDetail,
    CreatePost,
    Follow,
    AboutAuthor,
    AboutTech,
    Login,
    NotFound,
    ServerError,
}

impl Template {
    /// Template name as shown in `data-template`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Index => "posts/index.html",
            Self::GroupList => "posts/group_list.html",
            Self::Profile => "posts/profile.html",
            Self::PostDetail => "posts/post_detail.html",
            Self::CreatePost => "posts/create_post.html",
            Self::Follow => "posts/follow.html",
            Self::AboutAuthor => "about/author.html",
            Self::AboutTech => "about/tech.html",
            Self::Login => "users/login.html",
            Self::NotFound => "core/404.html",
            Self::ServerError => "core/500.html",
        }
    }
}

/// Values shown on the create and edit form.
#[derive(Debug, Clone, Default)]
pub struct PostFormView {
    /// Set when editing an existing post.
    pub post_id: Option<i32>,
    pub text: String,
    /// Selected group ID as submitted.
    pub group: Option<String>,
    /// Storage key of the current image.
    pub image: Option<String>,
    pub errors: FormErrors,
}

impl PostFormView {
    /// Whether the form edits an existing post.
    #[must_use]
    pub const fn is_edit(&self) -> bool {
        self.post_id.is_some()
    }
}

/// Data for one page.
#[derive(Debug)]
pub enum Context<'a> {
    /// Index page around an already rendered post list.
    Index { fragment: &'a str },
    GroupList { feed: &'a GroupFeed },
    Profile {
        feed: &'a ProfileFeed,
        /// Whether to offer follow and unfollow buttons.
        show_follow: bool,
    },
    PostDetail {
        detail: &'a PostDetail,
        can_edit: bool,
        can_comment: bool,
    },
    PostForm {
        form: &'a PostFormView,
        groups: &'a [group::Model],
    },
    Follow { page: &'a Page<PostView> },
    AboutAuthor,
    AboutTech,
    Login { next: Option<&'a str> },
    Error { status: u16, message: &'a str },
}

impl Context<'_> {
    /// Template this context renders with.
    #[must_use]
    pub const fn template(&self) -> Template {
        match self {
            Self::Index { .. } => Template::Index,
            Self::GroupList { .. } => Template::GroupList,
            Self::Profile { .. } => Template::Profile,
            Self::PostDetail { .. } => Template::PostDetail,
            Self::PostForm { .. } => Template::CreatePost,
            Self::Follow { .. } => Template::Follow,
            Self::AboutAuthor => Template::AboutAuthor,
            Self::AboutTech => Template::AboutTech,
            Self::Login { .. } => Template::Login,
            Self::Error { status: 404, .. } => Template::NotFound,
            Self::Error { .. } => Template::ServerError,
        }
    }
}

/// Page renderer capability.
pub trait TemplateRenderer: Send + Sync {
    /// Render a full page for `viewer` (`None` for a guest).
    fn render(&self, viewer: Option<&user::Model>, context: &Context<'_>) -> AppResult<String>;

    /// Render the cacheable post list of the index page.
    fn render_index_fragment(&self, page: &Page<PostView>) -> AppResult<String>;
}

/// Escape text for HTML element content and attribute values.
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Built-in HTML renderer.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    media_url: String,
}

impl HtmlRenderer {
    /// Create a renderer. `media_url` prefixes stored image keys.
    #[must_use]
    pub fn new(media_url: impl Into<String>) -> Self {
        Self {
            media_url: media_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn image_url(&self, key: &str) -> String {
        format!("{}/{key}", self.media_url)
    }

    fn layout(
        &self,
        template: Template,
        title: &str,
        viewer: Option<&user::Model>,
        content: &str,
    ) -> String {
        let mut nav = format!(
            r#"<a href="{}">Главная</a> <a href="{}">Об авторе</a> <a href="{}">Технологии</a>"#,
            urls::index(),
            urls::about_author(),
            urls::about_tech()
        );
        match viewer {
            Some(user) => {
                let _ = write!(
                    nav,
                    r#" <a href="{}">Новая запись</a> <a href="{}">Избранные авторы</a> <span class="username">{}</span>"#,
                    urls::post_create(),
                    urls::follow_index(),
                    html_escape(&user.username)
                );
            }
            None => {
                let _ = write!(nav, r#" <a href="{}">Войти</a>"#, urls::login());
            }
        }

        format!(
            "<!DOCTYPE html>\n<html lang=\"ru\">\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body data-template=\"{}\">\n<header><nav>{nav}</nav></header>\n<main>\n{content}</main>\n</body>\n</html>\n",
            html_escape(title),
            template.name()
        )
    }

    fn post_card(&self, view: &PostView, with_group_link: bool) -> String {
        let post = &view.post;
        let mut html = format!(
            "<article class=\"post\" data-post-id=\"{}\">\n<ul>\n<li class=\"post-author\">Автор: <a href=\"{}\">{}</a></li>\n<li class=\"post-created\">Дата публикации: {}</li>\n</ul>\n",
            post.id,
            urls::profile(&view.author.username),
            html_escape(&view.author.username),
            post.created.format("%d.%m.%Y")
        );
        if let Some(key) = &post.image {
            let _ = writeln!(
                html,
                r#"<img class="post-image" src="{}" alt="">"#,
                html_escape(&self.image_url(key))
            );
        }
        let _ = writeln!(
            html,
            r#"<p class="post-text">{}</p>"#,
            html_escape(&post.text)
        );
        let _ = writeln!(
            html,
            r#"<a class="post-detail" href="{}">подробная информация</a>"#,
            urls::post_detail(post.id)
        );
        if with_group_link && let Some(group) = &view.group {
            let _ = writeln!(
                html,
                r#"<a class="post-group" data-group-slug="{}" href="{}">все записи группы {}</a>"#,
                html_escape(&group.slug),
                urls::group_list(&group.slug),
                html_escape(&group.title)
            );
        }
        html.push_str("</article>\n");
        html
    }

    fn post_list(&self, page: &Page<PostView>, path: &str, with_group_link: bool) -> String {
        let mut html = String::from("<section class=\"posts\">\n");
        for (i, view) in page.items.iter().enumerate() {
            if i > 0 {
                html.push_str("<hr>\n");
            }
            html.push_str(&self.post_card(view, with_group_link));
        }
        html.push_str("</section>\n");
        html.push_str(&Self::paginator(page, path));
        html
    }

    fn paginator<T>(page: &Page<T>, path: &str) -> String {
        let mut html = format!(
            "<nav class=\"paginator\" data-page=\"{}\" data-num-pages=\"{}\">",
            page.number, page.num_pages
        );
        if let Some(previous) = page.previous_page_number() {
            let _ = write!(
                html,
                r#"<a href="{}">первая</a> <a href="{}">предыдущая</a> "#,
                urls::with_page(path, 1),
                urls::with_page(path, previous)
            );
        }
        let _ = write!(
            html,
            "Страница {} из {}",
            page.number, page.num_pages
        );
        if let Some(next) = page.next_page_number() {
            let _ = write!(
                html,
                r#" <a href="{}">следующая</a> <a href="{}">последняя</a>"#,
                urls::with_page(path, next),
                urls::with_page(path, page.num_pages)
            );
        }
        html.push_str("</nav>\n");
        html
    }

    fn field_errors(errors: &FormErrors, field: &str) -> String {
        errors
            .get(field)
            .iter()
            .map(|message| {
                format!(
                    "<p class=\"field-error\" data-field=\"{field}\">{}</p>\n",
                    html_escape(message)
                )
            })
            .collect()
    }

    fn group_page(&self, feed: &GroupFeed) -> String {
        let group = &feed.group;
        format!(
            "<h1 class=\"group-title\" data-group-slug=\"{}\">{}</h1>\n<p class=\"group-description\">{}</p>\n{}",
            html_escape(&group.slug),
            html_escape(&group.title),
            html_escape(&group.description),
            self.post_list(&feed.page, &urls::group_list(&group.slug), false)
        )
    }

    fn profile_page(&self, feed: &ProfileFeed, show_follow: bool) -> String {
        let username = &feed.author.username;
        let mut html = format!(
            "<h1 class=\"profile-author\" data-username=\"{}\">Все посты пользователя {}</h1>\n<h3 class=\"post-count\">Всего постов: {}</h3>\n",
            html_escape(username),
            html_escape(username),
            feed.post_count
        );
        if show_follow {
            if feed.following {
                let _ = writeln!(
                    html,
                    r#"<a class="unfollow" href="{}">Отписаться</a>"#,
                    urls::profile_unfollow(username)
                );
            } else {
                let _ = writeln!(
                    html,
                    r#"<a class="follow" href="{}">Подписаться</a>"#,
                    urls::profile_follow(username)
                );
            }
        }
        html.push_str(&self.post_list(&feed.page, &urls::profile(username), true));
        html
    }

    fn detail_page(&self, detail: &PostDetail, can_edit: bool, can_comment: bool) -> String {
        let view = &detail.view;
        let post = &view.post;
        let mut html = format!(
            "<article class=\"post-detail\" data-post-id=\"{}\">\n<ul>\n<li class=\"post-created\">Дата публикации: {}</li>\n",
            post.id,
            post.created.format("%d.%m.%Y")
        );
        if let Some(group) = &view.group {
            let _ = writeln!(
                html,
                r#"<li class="post-group">Группа: <a data-group-slug="{}" href="{}">{}</a></li>"#,
                html_escape(&group.slug),
                urls::group_list(&group.slug),
                html_escape(&group.title)
            );
        }
        let _ = write!(
            html,
            "<li class=\"post-author\">Автор: <a href=\"{}\">{}</a></li>\n<li class=\"author-post-count\">Всего постов автора: {}</li>\n</ul>\n",
            urls::profile(&view.author.username),
            html_escape(&view.author.username),
            detail.author_post_count
        );
        if let Some(key) = &post.image {
            let _ = writeln!(
                html,
                r#"<img class="post-image" src="{}" alt="">"#,
                html_escape(&self.image_url(key))
            );
        }
        let _ = writeln!(
            html,
            r#"<p class="post-text">{}</p>"#,
            html_escape(&post.text)
        );
        if can_edit {
            let _ = writeln!(
                html,
                r#"<a class="post-edit" href="{}">редактировать запись</a>"#,
                urls::post_edit(post.id)
            );
        }
        html.push_str("</article>\n<section class=\"comments\">\n");
        for item in &detail.comments {
            let _ = writeln!(
                html,
                r#"<div class="comment" data-comment-id="{}"><a href="{}">{}</a><p class="comment-text">{}</p></div>"#,
                item.comment.id,
                urls::profile(&item.author.username),
                html_escape(&item.author.username),
                html_escape(&item.comment.text)
            );
        }
        if can_comment {
            let _ = writeln!(
                html,
                r#"<form class="comment-form" method="post" action="{}"><label for="id_text">Текст комментария</label><textarea name="text" id="id_text"></textarea><button type="submit">Отправить</button></form>"#,
                urls::add_comment(post.id)
            );
        }
        html.push_str("</section>\n");
        html
    }

    fn form_page(form: &PostFormView, groups: &[group::Model]) -> String {
        let (heading, action, button) = match form.post_id {
            Some(post_id) => ("Редактировать пост", urls::post_edit(post_id), "Сохранить"),
            None => ("Новый пост", urls::post_create(), "Добавить"),
        };

        let mut options = String::from("<option value=\"\">---------</option>");
        for group in groups {
            let value = group.id.to_string();
            let selected = if form.group.as_deref() == Some(value.as_str()) {
                " selected"
            } else {
                ""
            };
            let _ = write!(
                options,
                r#"<option value="{value}"{selected}>{}</option>"#,
                html_escape(&group.title)
            );
        }

        let current_image = form
            .image
            .as_ref()
            .map(|key| {
                format!(
                    "<p class=\"current-image\">На данный момент: {}</p>\n",
                    html_escape(key)
                )
            })
            .unwrap_or_default();

        format!(
            "<h1>{heading}</h1>\n<form class=\"post-form\" method=\"post\" enctype=\"multipart/form-data\" action=\"{action}\" data-edit=\"{}\">\n<label for=\"id_text\">Текст поста</label>\n<textarea name=\"text\" id=\"id_text\" required>{}</textarea>\n<small>Введите текст поста</small>\n{}<label for=\"id_group\">Группа</label>\n<select name=\"group\" id=\"id_group\">{options}</select>\n<small>Выберите группу</small>\n{}<label for=\"id_image\">Картинка</label>\n{current_image}<input type=\"file\" name=\"image\" id=\"id_image\" accept=\"image/*\">\n{}<button type=\"submit\">{button}</button>\n</form>\n",
            form.is_edit(),
            html_escape(&form.text),
            Self::field_errors(&form.errors, "text"),
            Self::field_errors(&form.errors, "group"),
            Self::field_errors(&form.errors, "image"),
        )
    }
}

impl TemplateRenderer for HtmlRenderer {
    fn render(&self, viewer: Option<&user::Model>, context: &Context<'_>) -> AppResult<String> {
        let template = context.template();
        let (title, content) = match context {
            Context::Index { fragment } => (
                "Последние обновления на сайте".to_string(),
                format!("<h1>Последние обновления на сайте</h1>\n{fragment}"),
            ),
            Context::GroupList { feed } => (
                format!("Записи сообщества {}", feed.group.title),
                self.group_page(feed),
            ),
            Context::Profile { feed, show_follow } => (
                format!("Профайл пользователя {}", feed.author.username),
                self.profile_page(feed, *show_follow),
            ),
            Context::PostDetail {
                detail,
                can_edit,
                can_comment,
            } => (
                format!("Пост {}", detail.view.post.text.chars().take(30).collect::<String>()),
                self.detail_page(detail, *can_edit, *can_comment),
            ),
            Context::PostForm { form, groups } => (
                if form.is_edit() {
                    "Редактировать пост".to_string()
                } else {
                    "Новый пост".to_string()
                },
                Self::form_page(form, groups),
            ),
            Context::Follow { page } => (
                "Избранные авторы".to_string(),
                format!(
                    "<h1>Избранные авторы</h1>\n{}",
                    self.post_list(page, &urls::follow_index(), true)
                ),
            ),
            Context::AboutAuthor => (
                "Об авторе проекта".to_string(),
                "<h1>Об авторе проекта</h1>\n<p>Yatube: учебный блог-проект.</p>\n".to_string(),
            ),
            Context::AboutTech => (
                "Технологии".to_string(),
                "<h1>Технологии</h1>\n<p>Rust, axum, sea-orm.</p>\n".to_string(),
            ),
            Context::Login { next } => (
                "Войти".to_string(),
                format!(
                    "<h1>Войти</h1>\n<p class=\"login-hint\" data-next=\"{}\">Передайте токен в заголовке Authorization: Bearer.</p>\n",
                    html_escape(next.unwrap_or_default())
                ),
            ),
            Context::Error { status, message } => (
                format!("Ошибка {status}"),
                format!(
                    "<h1>Ошибка {status}</h1>\n<p class=\"error-message\">{}</p>\n",
                    html_escape(message)
                ),
            ),
        };

        Ok(self.layout(template, &title, viewer, &content))
    }

    fn render_index_fragment(&self, page: &Page<PostView>) -> AppResult<String> {
        Ok(self.post_list(page, &urls::index(), true))
    }
}
