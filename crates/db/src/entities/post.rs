//! Post entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Human-readable field names, as shown on forms and in the admin.
pub const VERBOSE_NAMES: [(&str, &str); 4] = [
    ("text", "Текст"),
    ("created", "Дата создания"),
    ("author", "Автор"),
    ("group", "Группа"),
];

/// Hints shown under form fields.
pub const HELP_TEXTS: [(&str, &str); 2] = [
    ("text", "Введите текст поста"),
    ("group", "Выберите группу"),
];

/// Number of leading characters of the text used in the display form.
pub const TEXT_PREVIEW_CHARS: usize = 15;

/// Look up the verbose name of a post field.
#[must_use]
pub fn verbose_name(field: &str) -> Option<&'static str> {
    VERBOSE_NAMES
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, label)| *label)
}

/// Look up the help text of a post field.
#[must_use]
pub fn help_text(field: &str) -> Option<&'static str> {
    HELP_TEXTS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, text)| *text)
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    /// Set once on creation
    #[sea_orm(indexed)]
    pub created: DateTimeWithTimeZone,

    #[sea_orm(indexed)]
    pub author_id: i32,

    #[sea_orm(nullable, indexed)]
    pub group_id: Option<i32>,

    /// Storage key of the attached image
    #[sea_orm(nullable)]
    pub image: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,

    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_delete = "SetNull"
    )]
    Group,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
