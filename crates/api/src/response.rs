//! Page responses, redirects and the HTML error type.

use axum::{
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use yatube_common::AppError;
use yatube_core::Decision;
use yatube_db::entities::user;

use crate::urls;

/// Handler result for HTML pages.
pub type PageResult<T = Response> = Result<T, PageError>;

/// Error returned by page handlers.
///
/// The response it produces carries an [`ErrorPage`] extension; the error
/// page middleware swaps the body for the rendered error template.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Marker left on error responses for the error page middleware.
#[derive(Debug, Clone)]
pub struct ErrorPage {
    /// Response status.
    pub status: StatusCode,
    /// Message safe to show to the visitor.
    pub message: String,
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let code = self.0.error_code();

        // Log server errors
        if self.0.is_server_error() {
            tracing::error!(error = %self.0, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self.0, code = code, "Client error occurred");
        }

        let message = if self.0.is_server_error() {
            "Внутренняя ошибка сервера".to_string()
        } else if status == StatusCode::NOT_FOUND {
            "Страница не найдена".to_string()
        } else {
            self.0.to_string()
        };

        let mut response = (status, message.clone()).into_response();
        response
            .extensions_mut()
            .insert(ErrorPage { status, message });
        response
    }
}

/// Rendered page with status 200.
#[must_use]
pub fn page(body: String) -> Response {
    Html(body).into_response()
}

/// `302 Found` to `location`.
#[must_use]
pub fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Redirect a guest to the login page, returning to `next` afterwards.
fn login_redirect(next: &str) -> Response {
    redirect(&urls::login_with_next(next))
}

/// Resolve an access decision into the acting user or a redirect.
///
/// `next` is the path the visitor asked for; `post_id` is the post a
/// non-author is sent back to. A guest is always sent to the login page,
/// whatever the decision says.
pub fn authorize(
    decision: Decision,
    viewer: Option<user::Model>,
    next: &str,
    post_id: Option<i32>,
) -> Result<user::Model, Response> {
    match (decision, viewer) {
        (Decision::Allow, Some(user)) => Ok(user),
        (Decision::Allow | Decision::RedirectToLogin, _) => Err(login_redirect(next)),
        (Decision::RedirectToDetail, _) => Err(match post_id {
            Some(post_id) => redirect(&urls::post_detail(post_id)),
            None => redirect(&urls::index()),
        }),
    }
}
