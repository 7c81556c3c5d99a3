//! Group service.

use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;
use yatube_common::{AppError, AppResult};
use yatube_db::{entities::group, repositories::GroupRepository};

/// Input for creating a group.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupInput {
    /// Display title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// URL-safe unique identifier.
    #[validate(length(min = 1, max = 50), custom(function = "validate_slug"))]
    pub slug: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

fn validate_slug(slug: &str) -> Result<(), validator::ValidationError> {
    if slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        Err(validator::ValidationError::new("slug"))
    }
}

/// Group service for business logic.
#[derive(Clone)]
pub struct GroupService {
    group_repo: GroupRepository,
}

impl GroupService {
    /// Create a new group service.
    #[must_use]
    pub const fn new(group_repo: GroupRepository) -> Self {
        Self { group_repo }
    }

    /// Get a group by slug.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<group::Model> {
        self.group_repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::GroupNotFound(slug.to_string()))
    }

    /// Every group, ordered by title. Feeds the group choice on post forms.
    pub async fn list(&self) -> AppResult<Vec<group::Model>> {
        self.group_repo.find_all().await
    }

    /// Create a group.
    pub async fn create(&self, input: CreateGroupInput) -> AppResult<group::Model> {
        input.validate()?;

        if self.group_repo.find_by_slug(&input.slug).await?.is_some() {
            return Err(AppError::BadRequest("Slug already taken".to_string()));
        }

        let model = group::ActiveModel {
            title: Set(input.title),
            slug: Set(input.slug),
            description: Set(input.description),
            ..Default::default()
        };

        let group = self.group_repo.create(model).await?;
        info!(group_id = group.id, slug = %group.slug, "Group created");
        Ok(group)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use yatube_db::test_utils::setup_sqlite;

    fn input(title: &str, slug: &str) -> CreateGroupInput {
        CreateGroupInput {
            title: title.to_string(),
            slug: slug.to_string(),
            description: "Тестовое описание".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = setup_sqlite().await.unwrap();
        let service = GroupService::new(GroupRepository::new(db));

        let created = service
            .create(input("Тестовая группа", "test-slug"))
            .await
            .unwrap();
        let found = service.get_by_slug("test-slug").await.unwrap();

        assert_eq!(created, found);
        assert_eq!(found.to_string(), "Тестовая группа");
    }

    #[tokio::test]
    async fn test_list_ordered_by_title() {
        let db = setup_sqlite().await.unwrap();
        let service = GroupService::new(GroupRepository::new(db));

        service.create(input("Б", "b")).await.unwrap();
        service.create(input("А", "a")).await.unwrap();

        let titles: Vec<String> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.title)
            .collect();
        assert_eq!(titles, vec!["А", "Б"]);
    }

    #[tokio::test]
    async fn test_rejects_bad_slug() {
        let db = setup_sqlite().await.unwrap();
        let service = GroupService::new(GroupRepository::new(db));

        let result = service.create(input("Группа", "not a slug")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let missing = service.get_by_slug("absent").await;
        assert!(matches!(missing, Err(AppError::GroupNotFound(_))));
    }
}
