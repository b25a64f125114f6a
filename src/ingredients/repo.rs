use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ingredients::repo_types::Ingredient;
use crate::store::{MemoryStore, PgStore, StoreResult};

const INGREDIENT_COLUMNS: &str = "id, name, description, created_on, updated_on";

#[async_trait]
pub trait IngredientRepo: Send + Sync {
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Ingredient>>;
    /// Returns the ingredient with this exact name, creating it if absent.
    async fn find_or_create(&self, name: &str) -> StoreResult<Ingredient>;
    async fn list_all(&self) -> StoreResult<Vec<Ingredient>>;
}

#[async_trait]
impl IngredientRepo for PgStore {
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Ingredient>> {
        let sql = format!("SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE name = $1");
        let row = sqlx::query_as::<_, Ingredient>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_or_create(&self, name: &str) -> StoreResult<Ingredient> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let sql = format!(
            "INSERT INTO ingredients (id, name, created_on, updated_on)
             VALUES ($1, $2, $3, $3)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING {INGREDIENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Ingredient>(&sql)
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_all(&self) -> StoreResult<Vec<Ingredient>> {
        let sql = format!("SELECT {INGREDIENT_COLUMNS} FROM ingredients ORDER BY name");
        let rows = sqlx::query_as::<_, Ingredient>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl IngredientRepo for MemoryStore {
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Ingredient>> {
        Ok(self
            .tables()?
            .ingredients
            .iter()
            .find(|i| i.name == name)
            .cloned())
    }

    async fn find_or_create(&self, name: &str) -> StoreResult<Ingredient> {
        let mut t = self.tables()?;
        if let Some(existing) = t.ingredients.iter().find(|i| i.name == name) {
            return Ok(existing.clone());
        }
        let now = OffsetDateTime::now_utc();
        let created = Ingredient {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            created_on: now,
            updated_on: now,
        };
        t.ingredients.push(created.clone());
        Ok(created)
    }

    async fn list_all(&self) -> StoreResult<Vec<Ingredient>> {
        let mut all = self.tables()?.ingredients.clone();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }
}
