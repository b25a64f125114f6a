use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::categories::repo_types::Category;
use crate::recipes::repo_types::{
    IngredientLineDraft, Recipe, RecipeDraft, RecipeIngredientLine, RecipeRow,
};
use crate::store::memory::{newest_first, Tables};
use crate::store::{MemoryStore, PgStore, StoreResult};

const RECIPE_COLUMNS: &str = "id, author_id, title, description, instructions, \
    prep_time_minutes, cook_time_minutes, serving_size, difficulty_level, image_url, is_public, \
    calories, protein, carbs, fat, fiber, sugar, sodium, deleted, created_on, updated_on";

/// Recipe rows plus the two join tables they own. Favorites live in
/// `user_favorites`, one row per (user, recipe) pair.
#[async_trait]
pub trait RecipeRepo: Send + Sync {
    /// Inserts the recipe with its categories and ingredient lines atomically.
    async fn insert(
        &self,
        author_id: Uuid,
        draft: &RecipeDraft,
        category_ids: &[Uuid],
        lines: &[IngredientLineDraft],
    ) -> StoreResult<Recipe>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Recipe>>;
    async fn find_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Recipe>>;
    /// Overwrites scalars and rebuilds both relations atomically.
    async fn replace(
        &self,
        id: Uuid,
        draft: &RecipeDraft,
        category_ids: &[Uuid],
        lines: &[IngredientLineDraft],
    ) -> StoreResult<Option<Recipe>>;
    async fn mark_deleted(&self, id: Uuid) -> StoreResult<Option<Recipe>>;
    async fn categories_of(&self, recipe_id: Uuid) -> StoreResult<Vec<Category>>;
    async fn ingredient_lines(&self, recipe_id: Uuid) -> StoreResult<Vec<RecipeIngredientLine>>;
    /// Non-deleted recipes by this author, newest first.
    async fn list_by_author(&self, author_id: Uuid) -> StoreResult<Vec<Recipe>>;
    /// Every recipe tagged with the category, newest first.
    async fn list_by_category(&self, category_id: Uuid) -> StoreResult<Vec<Recipe>>;
    async fn count_public_visible(&self) -> StoreResult<i64>;
    /// `true` when the pair was not already present.
    async fn add_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> StoreResult<bool>;
    async fn remove_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> StoreResult<bool>;
    /// Every recipe the user favorited, deleted ones included.
    async fn favorites_of(&self, user_id: Uuid) -> StoreResult<Vec<Recipe>>;
    async fn favorited_by(&self, recipe_id: Uuid) -> StoreResult<Vec<Uuid>>;
}

fn into_recipes(rows: Vec<RecipeRow>) -> StoreResult<Vec<Recipe>> {
    rows.into_iter().map(Recipe::try_from).collect()
}

fn bind_draft<'q>(
    query: QueryAs<'q, Postgres, RecipeRow, PgArguments>,
    d: &'q RecipeDraft,
) -> QueryAs<'q, Postgres, RecipeRow, PgArguments> {
    query
        .bind(&d.title)
        .bind(&d.description)
        .bind(&d.instructions)
        .bind(d.prep_time_minutes)
        .bind(d.cook_time_minutes)
        .bind(d.serving_size)
        .bind(d.difficulty_level.map(|l| l.as_str()))
        .bind(&d.image_url)
        .bind(d.is_public)
        .bind(d.nutrition.calories)
        .bind(d.nutrition.protein)
        .bind(d.nutrition.carbs)
        .bind(d.nutrition.fat)
        .bind(d.nutrition.fiber)
        .bind(d.nutrition.sugar)
        .bind(d.nutrition.sodium)
}

async fn write_relations(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    category_ids: &[Uuid],
    lines: &[IngredientLineDraft],
) -> StoreResult<()> {
    for category_id in category_ids {
        sqlx::query(
            "INSERT INTO recipe_categories (recipe_id, category_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(recipe_id)
        .bind(category_id)
        .execute(&mut **tx)
        .await?;
    }
    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            "INSERT INTO recipe_ingredients
                 (id, recipe_id, ingredient_id, quantity, unit, notes, position)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4())
        .bind(recipe_id)
        .bind(line.ingredient_id)
        .bind(&line.quantity)
        .bind(&line.unit)
        .bind(&line.notes)
        .bind(position as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl RecipeRepo for PgStore {
    async fn insert(
        &self,
        author_id: Uuid,
        draft: &RecipeDraft,
        category_ids: &[Uuid],
        lines: &[IngredientLineDraft],
    ) -> StoreResult<Recipe> {
        let id = Uuid::new_v4();
        let sql = format!(
            "INSERT INTO recipes (id, author_id, title, description, instructions,
                 prep_time_minutes, cook_time_minutes, serving_size, difficulty_level, image_url,
                 is_public, calories, protein, carbs, fat, fiber, sugar, sodium,
                 deleted, created_on, updated_on)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                     $17, $18, FALSE, $19, $19)
             RETURNING {RECIPE_COLUMNS}"
        );
        let mut tx = self.pool.begin().await?;
        let query = sqlx::query_as::<_, RecipeRow>(&sql).bind(id).bind(author_id);
        let row = bind_draft(query, draft)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(&mut *tx)
            .await?;
        write_relations(&mut tx, id, category_ids, lines).await?;
        tx.commit().await?;
        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Recipe>> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1");
        let row = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Recipe::try_from).transpose()
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Recipe>> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        into_recipes(rows)
    }

    async fn replace(
        &self,
        id: Uuid,
        draft: &RecipeDraft,
        category_ids: &[Uuid],
        lines: &[IngredientLineDraft],
    ) -> StoreResult<Option<Recipe>> {
        let sql = format!(
            "UPDATE recipes
                SET title = $2, description = $3, instructions = $4, prep_time_minutes = $5,
                    cook_time_minutes = $6, serving_size = $7, difficulty_level = $8,
                    image_url = $9, is_public = $10, calories = $11, protein = $12,
                    carbs = $13, fat = $14, fiber = $15, sugar = $16, sodium = $17,
                    updated_on = $18
              WHERE id = $1
          RETURNING {RECIPE_COLUMNS}"
        );
        let mut tx = self.pool.begin().await?;
        let query = sqlx::query_as::<_, RecipeRow>(&sql).bind(id);
        let Some(row) = bind_draft(query, draft)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM recipe_categories WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        write_relations(&mut tx, id, category_ids, lines).await?;
        tx.commit().await?;
        Recipe::try_from(row).map(Some)
    }

    async fn mark_deleted(&self, id: Uuid) -> StoreResult<Option<Recipe>> {
        let sql = format!(
            "UPDATE recipes SET deleted = TRUE, updated_on = $2 WHERE id = $1
             RETURNING {RECIPE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(id)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Recipe::try_from).transpose()
    }

    async fn categories_of(&self, recipe_id: Uuid) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT c.id, c.name, c.description
               FROM categories c
               JOIN recipe_categories rc ON rc.category_id = c.id
              WHERE rc.recipe_id = $1
              ORDER BY c.name",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn ingredient_lines(&self, recipe_id: Uuid) -> StoreResult<Vec<RecipeIngredientLine>> {
        let rows = sqlx::query_as::<_, RecipeIngredientLine>(
            "SELECT ri.id, ri.recipe_id, ri.ingredient_id, i.name AS ingredient_name,
                    ri.quantity, ri.unit, ri.notes, ri.position
               FROM recipe_ingredients ri
               JOIN ingredients i ON i.id = ri.ingredient_id
              WHERE ri.recipe_id = $1
              ORDER BY ri.position",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_by_author(&self, author_id: Uuid) -> StoreResult<Vec<Recipe>> {
        let sql = format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes
              WHERE author_id = $1 AND deleted = FALSE
              ORDER BY created_on DESC"
        );
        let rows = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        into_recipes(rows)
    }

    async fn list_by_category(&self, category_id: Uuid) -> StoreResult<Vec<Recipe>> {
        let sql = format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes
              WHERE id IN (SELECT recipe_id FROM recipe_categories WHERE category_id = $1)
              ORDER BY created_on DESC"
        );
        let rows = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await?;
        into_recipes(rows)
    }

    async fn count_public_visible(&self) -> StoreResult<i64> {
        let n = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM recipes WHERE is_public = TRUE AND deleted = FALSE",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(n)
    }

    async fn add_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> StoreResult<bool> {
        let done = sqlx::query(
            "INSERT INTO user_favorites (user_id, recipe_id, created_on) VALUES ($1, $2, $3)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(recipe_id)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() == 1)
    }

    async fn remove_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> StoreResult<bool> {
        let done = sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() == 1)
    }

    async fn favorites_of(&self, user_id: Uuid) -> StoreResult<Vec<Recipe>> {
        let sql = format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes
              WHERE id IN (SELECT recipe_id FROM user_favorites WHERE user_id = $1)
              ORDER BY created_on DESC"
        );
        let rows = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        into_recipes(rows)
    }

    async fn favorited_by(&self, recipe_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM user_favorites WHERE recipe_id = $1",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

fn rebuild_relations(
    t: &mut Tables,
    recipe_id: Uuid,
    category_ids: &[Uuid],
    lines: &[IngredientLineDraft],
) {
    t.recipe_categories.retain(|(r, _)| *r != recipe_id);
    t.recipe_ingredients.retain(|l| l.recipe_id != recipe_id);
    for category_id in category_ids {
        if !t.recipe_categories.contains(&(recipe_id, *category_id)) {
            t.recipe_categories.push((recipe_id, *category_id));
        }
    }
    for (position, line) in lines.iter().enumerate() {
        t.recipe_ingredients.push(RecipeIngredientLine {
            id: Uuid::new_v4(),
            recipe_id,
            ingredient_id: line.ingredient_id,
            ingredient_name: line.ingredient_name.clone(),
            quantity: line.quantity.clone(),
            unit: line.unit.clone(),
            notes: line.notes.clone(),
            position: position as i32,
        });
    }
}

fn apply_draft(recipe: &mut Recipe, d: &RecipeDraft) {
    recipe.title = d.title.clone();
    recipe.description = d.description.clone();
    recipe.instructions = d.instructions.clone();
    recipe.prep_time_minutes = d.prep_time_minutes;
    recipe.cook_time_minutes = d.cook_time_minutes;
    recipe.serving_size = d.serving_size;
    recipe.difficulty_level = d.difficulty_level;
    recipe.image_url = d.image_url.clone();
    recipe.is_public = d.is_public;
    recipe.nutrition = d.nutrition.clone();
}

#[async_trait]
impl RecipeRepo for MemoryStore {
    async fn insert(
        &self,
        author_id: Uuid,
        draft: &RecipeDraft,
        category_ids: &[Uuid],
        lines: &[IngredientLineDraft],
    ) -> StoreResult<Recipe> {
        let mut t = self.tables()?;
        let now = OffsetDateTime::now_utc();
        let mut recipe = Recipe {
            id: Uuid::new_v4(),
            author_id,
            title: String::new(),
            description: None,
            instructions: String::new(),
            prep_time_minutes: None,
            cook_time_minutes: None,
            serving_size: None,
            difficulty_level: None,
            image_url: None,
            is_public: true,
            nutrition: Default::default(),
            deleted: false,
            created_on: now,
            updated_on: now,
        };
        apply_draft(&mut recipe, draft);
        rebuild_relations(&mut t, recipe.id, category_ids, lines);
        t.recipes.push(recipe.clone());
        Ok(recipe)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Recipe>> {
        Ok(self.tables()?.recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Recipe>> {
        Ok(self
            .tables()?
            .recipes
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn replace(
        &self,
        id: Uuid,
        draft: &RecipeDraft,
        category_ids: &[Uuid],
        lines: &[IngredientLineDraft],
    ) -> StoreResult<Option<Recipe>> {
        let mut t = self.tables()?;
        let Some(recipe) = t.recipes.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        apply_draft(recipe, draft);
        recipe.updated_on = OffsetDateTime::now_utc();
        let updated = recipe.clone();
        rebuild_relations(&mut t, id, category_ids, lines);
        Ok(Some(updated))
    }

    async fn mark_deleted(&self, id: Uuid) -> StoreResult<Option<Recipe>> {
        let mut t = self.tables()?;
        let Some(recipe) = t.recipes.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        recipe.deleted = true;
        recipe.updated_on = OffsetDateTime::now_utc();
        Ok(Some(recipe.clone()))
    }

    async fn categories_of(&self, recipe_id: Uuid) -> StoreResult<Vec<Category>> {
        let t = self.tables()?;
        let mut found: Vec<Category> = t
            .categories
            .iter()
            .filter(|c| t.recipe_categories.contains(&(recipe_id, c.id)))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn ingredient_lines(&self, recipe_id: Uuid) -> StoreResult<Vec<RecipeIngredientLine>> {
        let mut lines: Vec<RecipeIngredientLine> = self
            .tables()?
            .recipe_ingredients
            .iter()
            .filter(|l| l.recipe_id == recipe_id)
            .cloned()
            .collect();
        lines.sort_by_key(|l| l.position);
        Ok(lines)
    }

    async fn list_by_author(&self, author_id: Uuid) -> StoreResult<Vec<Recipe>> {
        let t = self.tables()?;
        let rows = t
            .recipes
            .iter()
            .filter(|r| r.author_id == author_id && !r.deleted)
            .cloned();
        Ok(newest_first(rows, |r| r.created_on))
    }

    async fn list_by_category(&self, category_id: Uuid) -> StoreResult<Vec<Recipe>> {
        let t = self.tables()?;
        let rows = t
            .recipes
            .iter()
            .filter(|r| t.recipe_categories.contains(&(r.id, category_id)))
            .cloned()
            .collect::<Vec<_>>();
        Ok(newest_first(rows.into_iter(), |r| r.created_on))
    }

    async fn count_public_visible(&self) -> StoreResult<i64> {
        Ok(self
            .tables()?
            .recipes
            .iter()
            .filter(|r| r.is_public && !r.deleted)
            .count() as i64)
    }

    async fn add_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables()?;
        if t.favorites.contains(&(user_id, recipe_id)) {
            return Ok(false);
        }
        t.favorites.push((user_id, recipe_id));
        Ok(true)
    }

    async fn remove_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables()?;
        let before = t.favorites.len();
        t.favorites.retain(|pair| *pair != (user_id, recipe_id));
        Ok(t.favorites.len() < before)
    }

    async fn favorites_of(&self, user_id: Uuid) -> StoreResult<Vec<Recipe>> {
        let t = self.tables()?;
        let rows = t
            .recipes
            .iter()
            .filter(|r| t.favorites.contains(&(user_id, r.id)))
            .cloned()
            .collect::<Vec<_>>();
        Ok(newest_first(rows.into_iter(), |r| r.created_on))
    }

    async fn favorited_by(&self, recipe_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(self
            .tables()?
            .favorites
            .iter()
            .filter(|(_, r)| *r == recipe_id)
            .map(|(u, _)| *u)
            .collect())
    }
}
