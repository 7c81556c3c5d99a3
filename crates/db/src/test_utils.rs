//! Test utilities for database operations.
//!
//! Provides an in-memory SQLite database with the full schema applied and
//! a handful of fixture builders.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, Set};
use sea_orm_migration::MigratorTrait;

use crate::entities::{comment, follow, group, post, user};
use crate::migrations::Migrator;

/// Connect to a fresh in-memory SQLite database and run all migrations.
///
/// The pool is capped at one connection: every SQLite `:memory:`
/// connection is its own database.
pub async fn setup_sqlite() -> Result<Arc<DatabaseConnection>, DbErr> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await?;
    Migrator::up(&db, None).await?;
    Ok(Arc::new(db))
}

/// Insert a user with a token derived from the username.
pub async fn create_user(db: &DatabaseConnection, username: &str) -> Result<user::Model, DbErr> {
    user::ActiveModel {
        username: Set(username.to_string()),
        token: Set(Some(format!("token-{username}"))),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Insert a group.
pub async fn create_group(
    db: &DatabaseConnection,
    title: &str,
    slug: &str,
    description: &str,
) -> Result<group::Model, DbErr> {
    group::ActiveModel {
        title: Set(title.to_string()),
        slug: Set(slug.to_string()),
        description: Set(description.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Insert a post without an image.
pub async fn create_post(
    db: &DatabaseConnection,
    author: &user::Model,
    group: Option<&group::Model>,
    text: &str,
) -> Result<post::Model, DbErr> {
    post::ActiveModel {
        text: Set(text.to_string()),
        created: Set(Utc::now().into()),
        author_id: Set(author.id),
        group_id: Set(group.map(|g| g.id)),
        image: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Insert a comment.
pub async fn create_comment(
    db: &DatabaseConnection,
    post: &post::Model,
    author: &user::Model,
    text: &str,
) -> Result<comment::Model, DbErr> {
    comment::ActiveModel {
        post_id: Set(post.id),
        author_id: Set(author.id),
        text: Set(text.to_string()),
        created: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Insert a follow edge.
pub async fn create_follow(
    db: &DatabaseConnection,
    user: &user::Model,
    author: &user::Model,
) -> Result<follow::Model, DbErr> {
    follow::ActiveModel {
        user_id: Set(user.id),
        author_id: Set(author.id),
        ..Default::default()
    }
    .insert(db)
    .await
}
