use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::categories::repo_types::{Category, CategoryCount};
use crate::store::{MemoryStore, PgStore, StoreError, StoreResult};

#[async_trait]
pub trait CategoryRepo: Send + Sync {
    async fn list_all(&self) -> StoreResult<Vec<Category>>;
    /// Categories whose name is one of `names`, ordered by name.
    async fn find_by_names(&self, names: &[String]) -> StoreResult<Vec<Category>>;
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Category>>;
    async fn insert(&self, name: &str, description: &str) -> StoreResult<Category>;
    async fn count(&self) -> StoreResult<i64>;
    async fn recipe_counts(&self) -> StoreResult<Vec<CategoryCount>>;
}

#[async_trait]
impl CategoryRepo for PgStore {
    async fn list_all(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_names(&self, names: &[String]) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories WHERE name = ANY($1) ORDER BY name",
        )
        .bind(names)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert(&self, name: &str, description: &str) -> StoreResult<Category> {
        let row = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name, description) VALUES ($1, $2, $3)
             RETURNING id, name, description",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn count(&self) -> StoreResult<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn recipe_counts(&self) -> StoreResult<Vec<CategoryCount>> {
        let rows = sqlx::query_as::<_, CategoryCount>(
            "SELECT c.name, COUNT(r.id) AS recipe_count
               FROM categories c
               LEFT JOIN recipe_categories rc ON rc.category_id = c.id
               LEFT JOIN recipes r ON r.id = rc.recipe_id AND r.deleted = FALSE
              GROUP BY c.name
              ORDER BY c.name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl CategoryRepo for MemoryStore {
    async fn list_all(&self) -> StoreResult<Vec<Category>> {
        let mut all = self.tables()?.categories.clone();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn find_by_names(&self, names: &[String]) -> StoreResult<Vec<Category>> {
        let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
        let mut found: Vec<Category> = self
            .tables()?
            .categories
            .iter()
            .filter(|c| wanted.contains(c.name.as_str()))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Category>> {
        Ok(self
            .tables()?
            .categories
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn insert(&self, name: &str, description: &str) -> StoreResult<Category> {
        let mut t = self.tables()?;
        if t.categories.iter().any(|c| c.name == name) {
            return Err(StoreError::UniqueViolation("categories_name_key".into()));
        }
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: Some(description.to_string()),
        };
        t.categories.push(category.clone());
        Ok(category)
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(self.tables()?.categories.len() as i64)
    }

    async fn recipe_counts(&self) -> StoreResult<Vec<CategoryCount>> {
        let t = self.tables()?;
        let mut counts: Vec<CategoryCount> = t
            .categories
            .iter()
            .map(|c| {
                let recipe_count = t
                    .recipe_categories
                    .iter()
                    .filter(|(recipe_id, category_id)| {
                        *category_id == c.id
                            && t.recipes.iter().any(|r| r.id == *recipe_id && !r.deleted)
                    })
                    .count() as i64;
                CategoryCount {
                    name: c.name.clone(),
                    recipe_count,
                }
            })
            .collect();
        counts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(counts)
    }
}
