//! User service.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;
use yatube_common::{AppError, AppResult, IdGenerator};
use yatube_db::{entities::user, repositories::UserRepository};

/// Input for creating a user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    /// Unique username.
    #[validate(length(min = 1, max = 150))]
    pub username: String,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a user with a fresh API token.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest("Username already taken".to_string()));
        }

        let model = user::ActiveModel {
            username: Set(input.username),
            token: Set(Some(self.id_gen.generate_token())),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let user = self.user_repo.create(model).await?;
        info!(user_id = user.id, username = %user.username, "User created");
        Ok(user)
    }

    /// Resolve an API token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        if token.is_empty() {
            return Ok(None);
        }
        self.user_repo.find_by_token(token).await
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))
    }
}
