//! Database integration tests.
//!
//! These run against an in-memory SQLite database with the full migration
//! set applied and check the constraints the schema enforces.

#![allow(clippy::unwrap_used)]

use sea_orm::{EntityTrait, ModelTrait};
use yatube_db::{
    entities::{Comment, Follow, Post},
    repositories::{FollowRepository, PostFilter, PostRepository},
    test_utils::{
        create_comment, create_follow, create_group, create_post, create_user, setup_sqlite,
    },
};

#[tokio::test]
async fn test_migrations_apply_on_fresh_database() {
    let db = setup_sqlite().await;
    assert!(db.is_ok(), "Migrations failed: {:?}", db.err());
}

#[tokio::test]
async fn test_username_is_unique() {
    let db = setup_sqlite().await.unwrap();
    create_user(&db, "leo").await.unwrap();

    let duplicate = create_user(&db, "leo").await;
    assert!(duplicate.is_err());
}

#[tokio::test]
async fn test_group_slug_is_unique() {
    let db = setup_sqlite().await.unwrap();
    create_group(&db, "Коты", "cats", "").await.unwrap();

    let duplicate = create_group(&db, "Кошки", "cats", "").await;
    assert!(duplicate.is_err());
}

#[tokio::test]
async fn test_follow_pair_is_unique() {
    let db = setup_sqlite().await.unwrap();
    let reader = create_user(&db, "reader").await.unwrap();
    let author = create_user(&db, "author").await.unwrap();

    create_follow(&db, &reader, &author).await.unwrap();
    assert!(create_follow(&db, &reader, &author).await.is_err());

    // The reverse edge is a different pair
    create_follow(&db, &author, &reader).await.unwrap();
    assert_eq!(Follow::find().all(db.as_ref()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_if_absent_tolerates_existing_edge() {
    let db = setup_sqlite().await.unwrap();
    let reader = create_user(&db, "reader").await.unwrap();
    let author = create_user(&db, "author").await.unwrap();
    let repo = FollowRepository::new(db.clone());

    assert!(repo.create_if_absent(reader.id, author.id).await.unwrap());
    assert!(!repo.create_if_absent(reader.id, author.id).await.unwrap());
    assert!(repo.is_following(reader.id, author.id).await.unwrap());
}

#[tokio::test]
async fn test_deleting_group_keeps_posts() {
    let db = setup_sqlite().await.unwrap();
    let author = create_user(&db, "author").await.unwrap();
    let group = create_group(&db, "Коты", "cats", "").await.unwrap();
    let post = create_post(&db, &author, Some(&group), "мяу").await.unwrap();

    group.delete(db.as_ref()).await.unwrap();

    let stored = Post::find_by_id(post.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.group_id, None);
}

#[tokio::test]
async fn test_deleting_author_removes_posts_and_comments() {
    let db = setup_sqlite().await.unwrap();
    let author = create_user(&db, "author").await.unwrap();
    let reader = create_user(&db, "reader").await.unwrap();
    let post = create_post(&db, &author, None, "текст").await.unwrap();
    create_comment(&db, &post, &reader, "комментарий").await.unwrap();
    create_follow(&db, &reader, &author).await.unwrap();

    author.delete(db.as_ref()).await.unwrap();

    assert!(Post::find().all(db.as_ref()).await.unwrap().is_empty());
    assert!(Comment::find().all(db.as_ref()).await.unwrap().is_empty());
    assert!(Follow::find().all(db.as_ref()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_followed_by_filter_selects_followed_authors() {
    let db = setup_sqlite().await.unwrap();
    let reader = create_user(&db, "reader").await.unwrap();
    let followed = create_user(&db, "followed").await.unwrap();
    let stranger = create_user(&db, "stranger").await.unwrap();
    create_post(&db, &followed, None, "от подписки").await.unwrap();
    create_post(&db, &stranger, None, "от незнакомца").await.unwrap();
    create_follow(&db, &reader, &followed).await.unwrap();

    let repo = PostRepository::new(db.clone());
    let filter = PostFilter::FollowedBy(reader.id);

    assert_eq!(repo.count(filter).await.unwrap(), 1);
    let posts = repo.find_page(filter, 0, 10).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].author_id, followed.id);
}
