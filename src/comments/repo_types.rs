use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A comment joined with the author fields shown next to it.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub author_profile_picture: Option<String>,
    pub content: String,
    pub rating: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_on: OffsetDateTime,
}

pub struct NewComment {
    pub recipe_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub rating: i32,
}
