//! Post service: creation, editing and the detail page.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;
use tracing::{debug, info, warn};
use validator::Validate;
use yatube_common::{AppError, AppResult, IdGenerator, StorageBackend, save_unique};
use yatube_db::{
    entities::{post, user},
    repositories::{GroupRepository, PostRepository, UserRepository},
};

use crate::services::comment::{CommentService, CommentView};
use crate::services::feed::PostView;
use crate::services::form::{
    FormErrors, FormOutcome, INVALID_CHOICE_MESSAGE, INVALID_IMAGE_MESSAGE,
};
use crate::services::media::{ImageInfo, inspect_image};

/// Storage directory for post images.
pub const IMAGE_DIR: &str = "posts";

/// An uploaded image file.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// File name as sent by the client.
    pub file_name: String,
    /// Raw file contents.
    pub data: Vec<u8>,
}

/// A submitted post form.
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    /// Post text.
    pub text: String,
    /// Raw group choice; empty or absent means no group.
    pub group: Option<String>,
    /// New image, if one was uploaded.
    pub image: Option<ImageUpload>,
}

/// Everything shown on a post's own page.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    /// The post with author and group.
    pub view: PostView,
    /// Comments, oldest first.
    pub comments: Vec<CommentView>,
    /// Total posts by the same author.
    pub author_post_count: u64,
}

#[derive(Debug, Validate)]
struct PostForm {
    #[validate(length(min = 1, message = "Обязательное поле."))]
    text: String,
}

struct CleanPost {
    text: String,
    group_id: Option<i32>,
    image: Option<(ImageUpload, ImageInfo)>,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    group_repo: GroupRepository,
    comments: CommentService,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        group_repo: GroupRepository,
        comments: CommentService,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            group_repo,
            comments,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a post by ID.
    pub async fn get(&self, post_id: i32) -> AppResult<post::Model> {
        self.post_repo.get_by_id(post_id).await
    }

    /// Create a post written by `author`.
    pub async fn create(
        &self,
        author: &user::Model,
        input: PostInput,
    ) -> AppResult<FormOutcome<post::Model>> {
        let clean = match self.clean(input).await? {
            Ok(clean) => clean,
            Err(errors) => return Ok(FormOutcome::Invalid(errors)),
        };

        let image = match clean.image {
            Some((upload, info)) => Some(self.store_image(&upload, info).await?),
            None => None,
        };

        let model = post::ActiveModel {
            text: Set(clean.text),
            created: Set(Utc::now().into()),
            author_id: Set(author.id),
            group_id: Set(clean.group_id),
            image: Set(image.clone()),
            ..Default::default()
        };

        let post = match self.post_repo.create(model).await {
            Ok(post) => post,
            Err(e) => {
                self.discard_image(image.as_deref()).await;
                return Err(e);
            }
        };
        info!(post_id = post.id, author_id = author.id, "Post created");
        Ok(FormOutcome::Saved(post))
    }

    /// Edit a post. Only its author may do so.
    ///
    /// Text and group are replaced by the submitted values; the image is
    /// replaced only when a new file was uploaded.
    pub async fn edit(
        &self,
        editor: &user::Model,
        post_id: i32,
        input: PostInput,
    ) -> AppResult<FormOutcome<post::Model>> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.author_id != editor.id {
            return Err(AppError::Forbidden(format!(
                "User {} is not the author of post {post_id}",
                editor.id
            )));
        }

        let clean = match self.clean(input).await? {
            Ok(clean) => clean,
            Err(errors) => return Ok(FormOutcome::Invalid(errors)),
        };

        let new_image = match clean.image {
            Some((upload, info)) => Some(self.store_image(&upload, info).await?),
            None => None,
        };

        let mut model: post::ActiveModel = post.into();
        model.text = Set(clean.text);
        model.group_id = Set(clean.group_id);
        if let Some(key) = &new_image {
            model.image = Set(Some(key.clone()));
        }

        let post = match self.post_repo.update(model).await {
            Ok(post) => post,
            Err(e) => {
                self.discard_image(new_image.as_deref()).await;
                return Err(e);
            }
        };
        info!(post_id = post.id, editor_id = editor.id, "Post edited");
        Ok(FormOutcome::Saved(post))
    }

    /// Load the post page: the post, its comments and the author's post count.
    pub async fn get_detail(&self, post_id: i32) -> AppResult<PostDetail> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let author = self.user_repo.get_by_id(post.author_id).await?;
        let group = match post.group_id {
            Some(group_id) => self.group_repo.find_by_id(group_id).await?,
            None => None,
        };

        let comments = self.comments.list_for_post(post.id).await?;
        let author_post_count = self.post_repo.count_by_author(author.id).await?;

        Ok(PostDetail {
            view: PostView {
                post,
                author,
                group,
            },
            comments,
            author_post_count,
        })
    }

    /// Public URL of a stored image.
    #[must_use]
    pub fn image_url(&self, key: &str) -> String {
        self.storage.public_url(key)
    }

    async fn clean(&self, input: PostInput) -> AppResult<Result<CleanPost, FormErrors>> {
        let form = PostForm {
            text: input.text.trim().to_string(),
        };
        let mut errors = form
            .validate()
            .err()
            .map(FormErrors::from)
            .unwrap_or_default();

        let group_id = match input.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let found = match raw.parse::<i32>() {
                    Ok(id) => self.group_repo.find_by_id(id).await?.map(|g| g.id),
                    Err(_) => None,
                };
                if found.is_none() {
                    errors.add("group", INVALID_CHOICE_MESSAGE);
                }
                found
            }
        };

        let image = match input.image {
            Some(upload) if !upload.data.is_empty() => match inspect_image(&upload.data) {
                Ok(info) => Some((upload, info)),
                Err(e) => {
                    debug!(file_name = %upload.file_name, error = %e, "Rejected upload");
                    errors.add("image", INVALID_IMAGE_MESSAGE);
                    None
                }
            },
            _ => None,
        };

        if errors.is_empty() {
            Ok(Ok(CleanPost {
                text: form.text,
                group_id,
                image,
            }))
        } else {
            Ok(Err(errors))
        }
    }

    async fn store_image(&self, upload: &ImageUpload, info: ImageInfo) -> AppResult<String> {
        let stored = save_unique(
            self.storage.as_ref(),
            IMAGE_DIR,
            &upload.file_name,
            &upload.data,
            info.format.mime_type(),
            &self.id_gen,
        )
        .await?;
        debug!(key = %stored.key, size = stored.size, "Stored post image");
        Ok(stored.key)
    }

    /// Remove an image stored for a write that did not happen.
    async fn discard_image(&self, key: Option<&str>) {
        let Some(key) = key else {
            return;
        };
        if let Err(e) = self.storage.delete(key).await {
            warn!(key = %key, error = %e, "Failed to remove orphaned image");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::media::tests::SMALL_GIF;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
    use yatube_common::LocalStorage;
    use yatube_db::repositories::CommentRepository;
    use yatube_db::test_utils::{
        create_comment, create_group, create_post, create_user, setup_sqlite,
    };

    fn create_post_service(
        db: &Arc<sea_orm::DatabaseConnection>,
        media_root: &std::path::Path,
    ) -> PostService {
        PostService::new(
            PostRepository::new(db.clone()),
            UserRepository::new(db.clone()),
            GroupRepository::new(db.clone()),
            CommentService::new(
                CommentRepository::new(db.clone()),
                PostRepository::new(db.clone()),
                UserRepository::new(db.clone()),
            ),
            Arc::new(LocalStorage::new(
                media_root.to_path_buf(),
                "/media".to_string(),
            )),
        )
    }

    fn gif_upload() -> ImageUpload {
        ImageUpload {
            file_name: "small.gif".to_string(),
            data: SMALL_GIF.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_create_with_image() {
        let db = setup_sqlite().await.unwrap();
        let media = tempfile::tempdir().unwrap();
        let author = create_user(&db, "TestAuthor").await.unwrap();
        let group = create_group(&db, "Тестовая группа", "test-slug", "Тестовое описание")
            .await
            .unwrap();

        let posts = create_post_service(&db, media.path());
        let post = posts
            .create(
                &author,
                PostInput {
                    text: "1й текст".to_string(),
                    group: Some(group.id.to_string()),
                    image: Some(gif_upload()),
                },
            )
            .await
            .unwrap()
            .saved()
            .unwrap();

        assert_eq!(post.text, "1й текст");
        assert_eq!(post.group_id, Some(group.id));
        assert_eq!(post.image.as_deref(), Some("posts/small.gif"));
        assert!(media.path().join("posts/small.gif").exists());
        assert_eq!(posts.image_url("posts/small.gif"), "/media/posts/small.gif");
    }

    #[tokio::test]
    async fn test_create_name_collision_gets_suffix() {
        let db = setup_sqlite().await.unwrap();
        let media = tempfile::tempdir().unwrap();
        let author = create_user(&db, "TestAuthor").await.unwrap();

        let posts = create_post_service(&db, media.path());
        let input = PostInput {
            text: "1й текст".to_string(),
            group: None,
            image: Some(gif_upload()),
        };

        let first = posts.create(&author, input.clone()).await.unwrap().saved().unwrap();
        let second = posts.create(&author, input).await.unwrap().saved().unwrap();

        assert_eq!(first.image.as_deref(), Some("posts/small.gif"));
        assert_ne!(second.image, first.image);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_creates_keep_separate_images() {
        let db = setup_sqlite().await.unwrap();
        let media = tempfile::tempdir().unwrap();
        let author = create_user(&db, "TestAuthor").await.unwrap();
        let posts = create_post_service(&db, media.path());

        let upload = |data: &[u8]| PostInput {
            text: "1й текст".to_string(),
            group: None,
            image: Some(ImageUpload {
                file_name: "small.gif".to_string(),
                data: data.to_vec(),
            }),
        };
        // Same file name, different bytes
        let mut other_gif = SMALL_GIF.to_vec();
        other_gif[16] = 0x00;

        let (first, second) = tokio::join!(
            posts.create(&author, upload(SMALL_GIF)),
            posts.create(&author, upload(&other_gif)),
        );
        let first = first.unwrap().saved().unwrap();
        let second = second.unwrap().saved().unwrap();

        let first_key = first.image.unwrap();
        let second_key = second.image.unwrap();
        assert_ne!(first_key, second_key);
        assert_eq!(std::fs::read(media.path().join(&first_key)).unwrap(), SMALL_GIF);
        assert_eq!(std::fs::read(media.path().join(&second_key)).unwrap(), other_gif);
    }

    #[tokio::test]
    async fn test_failed_insert_removes_stored_image() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom("insert failed".to_string())])
                .append_exec_errors([DbErr::Custom("insert failed".to_string())])
                .into_connection(),
        );
        let media = tempfile::tempdir().unwrap();
        let author = user::Model {
            id: 1,
            username: "TestAuthor".to_string(),
            token: None,
            created_at: Utc::now().into(),
        };

        let posts = create_post_service(&db, media.path());
        let result = posts
            .create(
                &author,
                PostInput {
                    text: "1й текст".to_string(),
                    group: None,
                    image: Some(gif_upload()),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
        assert!(!media.path().join("posts/small.gif").exists());
    }

    #[tokio::test]
    async fn test_create_invalid_writes_nothing() {
        let db = setup_sqlite().await.unwrap();
        let media = tempfile::tempdir().unwrap();
        let author = create_user(&db, "TestAuthor").await.unwrap();

        let posts = create_post_service(&db, media.path());
        let outcome = posts
            .create(
                &author,
                PostInput {
                    text: "  ".to_string(),
                    group: Some("9999".to_string()),
                    image: Some(ImageUpload {
                        file_name: "notes.txt".to_string(),
                        data: b"plain text".to_vec(),
                    }),
                },
            )
            .await
            .unwrap();

        let errors = outcome.errors().unwrap();
        assert_eq!(errors.get("text"), ["Обязательное поле.".to_string()]);
        assert_eq!(
            errors.get("group"),
            ["Выберите корректный вариант.".to_string()]
        );
        assert_eq!(
            errors.get("image"),
            ["Загрузите правильное изображение.".to_string()]
        );

        let repo = PostRepository::new(db.clone());
        assert_eq!(repo.count_by_author(author.id).await.unwrap(), 0);
        assert!(!media.path().join("posts").exists());
    }

    #[tokio::test]
    async fn test_edit_by_author() {
        let db = setup_sqlite().await.unwrap();
        let media = tempfile::tempdir().unwrap();
        let author = create_user(&db, "TestAuthor").await.unwrap();
        let group = create_group(&db, "Тестовая группа", "test-slug", "Тестовое описание")
            .await
            .unwrap();
        let group2 = create_group(&db, "Тестовая группа 2", "test-slug2", "Описание")
            .await
            .unwrap();
        let post = create_post(&db, &author, Some(&group), "1й текст")
            .await
            .unwrap();

        let posts = create_post_service(&db, media.path());
        let edited = posts
            .edit(
                &author,
                post.id,
                PostInput {
                    text: "Редактированный текст".to_string(),
                    group: Some(group2.id.to_string()),
                    image: Some(gif_upload()),
                },
            )
            .await
            .unwrap()
            .saved()
            .unwrap();

        assert_eq!(edited.id, post.id);
        assert_eq!(edited.text, "Редактированный текст");
        assert_eq!(edited.group_id, Some(group2.id));
        assert_eq!(edited.image.as_deref(), Some("posts/small.gif"));
        assert_eq!(edited.created, post.created);
        assert_eq!(edited.author_id, author.id);

        // No new upload keeps the image; an empty group clears it
        let again = posts
            .edit(
                &author,
                post.id,
                PostInput {
                    text: "Ещё раз".to_string(),
                    group: Some(String::new()),
                    image: None,
                },
            )
            .await
            .unwrap()
            .saved()
            .unwrap();
        assert_eq!(again.image.as_deref(), Some("posts/small.gif"));
        assert_eq!(again.group_id, None);
    }

    #[tokio::test]
    async fn test_edit_by_other_user_leaves_post_unchanged() {
        let db = setup_sqlite().await.unwrap();
        let media = tempfile::tempdir().unwrap();
        let author = create_user(&db, "TestAuthor").await.unwrap();
        let other = create_user(&db, "TestUser").await.unwrap();
        let post = create_post(&db, &author, None, "1й текст").await.unwrap();

        let posts = create_post_service(&db, media.path());
        let result = posts
            .edit(
                &other,
                post.id,
                PostInput {
                    text: "Редактированный текст".to_string(),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(posts.get(post.id).await.unwrap(), post);
    }

    #[tokio::test]
    async fn test_edit_invalid_leaves_post_unchanged() {
        let db = setup_sqlite().await.unwrap();
        let media = tempfile::tempdir().unwrap();
        let author = create_user(&db, "TestAuthor").await.unwrap();
        let post = create_post(&db, &author, None, "1й текст").await.unwrap();

        let posts = create_post_service(&db, media.path());
        let outcome = posts
            .edit(&author, post.id, PostInput::default())
            .await
            .unwrap();

        assert!(outcome.errors().is_some());
        assert_eq!(posts.get(post.id).await.unwrap(), post);
    }

    #[tokio::test]
    async fn test_get_detail() {
        let db = setup_sqlite().await.unwrap();
        let media = tempfile::tempdir().unwrap();
        let author = create_user(&db, "TestAuthor").await.unwrap();
        let reader = create_user(&db, "TestUser").await.unwrap();
        let group = create_group(&db, "Тестовая группа", "test-slug", "Тестовое описание")
            .await
            .unwrap();
        let post = create_post(&db, &author, Some(&group), "1й текст")
            .await
            .unwrap();
        create_post(&db, &author, None, "2й текст").await.unwrap();
        create_comment(&db, &post, &reader, "Тестовый комментарий")
            .await
            .unwrap();

        let posts = create_post_service(&db, media.path());
        let detail = posts.get_detail(post.id).await.unwrap();

        assert_eq!(detail.view.post.id, post.id);
        assert_eq!(detail.view.author.username, "TestAuthor");
        assert_eq!(detail.view.group.map(|g| g.slug).as_deref(), Some("test-slug"));
        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.comments[0].comment.text, "Тестовый комментарий");
        assert_eq!(detail.author_post_count, 2);

        assert!(matches!(
            posts.get_detail(999).await,
            Err(AppError::PostNotFound(999))
        ));
    }
}
