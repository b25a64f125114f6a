use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::comments::repo_types::{Comment, NewComment};
use crate::store::memory::newest_first;
use crate::store::{MemoryStore, PgStore, StoreError, StoreResult};

const COMMENT_VIEW: &str = "SELECT c.id, c.recipe_id, c.author_id, u.username AS author_username,
        u.profile_picture AS author_profile_picture, c.content, c.rating,
        c.created_on, c.updated_on
   FROM c JOIN users u ON u.id = c.author_id";

#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn insert(&self, comment: NewComment) -> StoreResult<Comment>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Comment>>;
    /// Newest first.
    async fn list_by_recipe(&self, recipe_id: Uuid) -> StoreResult<Vec<Comment>>;
    async fn update(&self, id: Uuid, content: &str, rating: i32) -> StoreResult<Option<Comment>>;
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
    async fn count(&self) -> StoreResult<i64>;
    async fn count_distinct_authors(&self) -> StoreResult<i64>;
    async fn count_distinct_recipes(&self) -> StoreResult<i64>;
}

#[async_trait]
impl CommentRepo for PgStore {
    async fn insert(&self, comment: NewComment) -> StoreResult<Comment> {
        let sql = format!(
            "WITH c AS (
                INSERT INTO comments (id, recipe_id, author_id, content, rating, created_on, updated_on)
                VALUES ($1, $2, $3, $4, $5, $6, $6)
                RETURNING *
             ) {COMMENT_VIEW}"
        );
        let row = sqlx::query_as::<_, Comment>(&sql)
            .bind(Uuid::new_v4())
            .bind(comment.recipe_id)
            .bind(comment.author_id)
            .bind(&comment.content)
            .bind(comment.rating)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let sql = format!("WITH c AS (SELECT * FROM comments WHERE id = $1) {COMMENT_VIEW}");
        let row = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_by_recipe(&self, recipe_id: Uuid) -> StoreResult<Vec<Comment>> {
        let sql = format!(
            "WITH c AS (SELECT * FROM comments WHERE recipe_id = $1) {COMMENT_VIEW}
             ORDER BY c.created_on DESC"
        );
        let rows = sqlx::query_as::<_, Comment>(&sql)
            .bind(recipe_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update(&self, id: Uuid, content: &str, rating: i32) -> StoreResult<Option<Comment>> {
        let sql = format!(
            "WITH c AS (
                UPDATE comments SET content = $2, rating = $3, updated_on = $4
                 WHERE id = $1
                RETURNING *
             ) {COMMENT_VIEW}"
        );
        let row = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .bind(content)
            .bind(rating)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let done = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() == 1)
    }

    async fn count(&self) -> StoreResult<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn count_distinct_authors(&self) -> StoreResult<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT author_id) FROM comments")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn count_distinct_recipes(&self) -> StoreResult<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT recipe_id) FROM comments")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

#[async_trait]
impl CommentRepo for MemoryStore {
    async fn insert(&self, comment: NewComment) -> StoreResult<Comment> {
        let mut t = self.tables()?;
        let author = t
            .users
            .iter()
            .find(|u| u.id == comment.author_id)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown author {}", comment.author_id)))?;
        let now = OffsetDateTime::now_utc();
        let created = Comment {
            id: Uuid::new_v4(),
            recipe_id: comment.recipe_id,
            author_id: comment.author_id,
            author_username: author.username.clone(),
            author_profile_picture: author.profile_picture.clone(),
            content: comment.content,
            rating: comment.rating,
            created_on: now,
            updated_on: now,
        };
        t.comments.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        Ok(self.tables()?.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list_by_recipe(&self, recipe_id: Uuid) -> StoreResult<Vec<Comment>> {
        let t = self.tables()?;
        let rows = t
            .comments
            .iter()
            .filter(|c| c.recipe_id == recipe_id)
            .cloned();
        Ok(newest_first(rows, |c| c.created_on))
    }

    async fn update(&self, id: Uuid, content: &str, rating: i32) -> StoreResult<Option<Comment>> {
        let mut t = self.tables()?;
        let Some(comment) = t.comments.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        comment.content = content.to_string();
        comment.rating = rating;
        comment.updated_on = OffsetDateTime::now_utc();
        Ok(Some(comment.clone()))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables()?;
        let before = t.comments.len();
        t.comments.retain(|c| c.id != id);
        Ok(t.comments.len() < before)
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(self.tables()?.comments.len() as i64)
    }

    async fn count_distinct_authors(&self) -> StoreResult<i64> {
        let t = self.tables()?;
        let mut ids: Vec<Uuid> = t.comments.iter().map(|c| c.author_id).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids.len() as i64)
    }

    async fn count_distinct_recipes(&self) -> StoreResult<i64> {
        let t = self.tables()?;
        let mut ids: Vec<Uuid> = t.comments.iter().map(|c| c.recipe_id).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids.len() as i64)
    }
}
