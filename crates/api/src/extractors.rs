//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use serde::Deserialize;
use yatube_core::parse_page_number;
use yatube_db::entities::user;

/// Optional authenticated user extractor. `None` for guests.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get user from request extensions (set by auth middleware)
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

/// `?page=` query parameter.
///
/// Kept as a raw string so that junk values fall back to page 1 instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Raw `page` value.
    pub page: Option<String>,
}

impl PageQuery {
    /// Requested 1-indexed page number.
    #[must_use]
    pub fn number(&self) -> u64 {
        parse_page_number(self.page.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_number() {
        assert_eq!(PageQuery::default().number(), 1);
        assert_eq!(
            PageQuery {
                page: Some("2".to_string())
            }
            .number(),
            2
        );
        assert_eq!(
            PageQuery {
                page: Some("last".to_string())
            }
            .number(),
            1
        );
    }
}
