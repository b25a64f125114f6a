use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::shopping::repo_types::{ItemChanges, NewShoppingItem, ShoppingListItem};
use crate::store::memory::newest_first;
use crate::store::{MemoryStore, PgStore, StoreError, StoreResult};

const ITEM_COLUMNS: &str = "id, user_id, name, quantity, unit, notes, custom_category, \
    completed, recipe_id, ingredient_id, created_on, updated_on";

#[async_trait]
pub trait ShoppingListRepo: Send + Sync {
    async fn insert(&self, item: NewShoppingItem) -> StoreResult<ShoppingListItem>;
    /// All rows or none.
    async fn insert_many(&self, items: Vec<NewShoppingItem>) -> StoreResult<Vec<ShoppingListItem>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<ShoppingListItem>>;
    async fn update(&self, id: Uuid, changes: &ItemChanges) -> StoreResult<Option<ShoppingListItem>>;
    async fn toggle_completed(&self, id: Uuid) -> StoreResult<Option<ShoppingListItem>>;
    async fn mark_all_completed(&self, user_id: Uuid) -> StoreResult<u64>;
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
    async fn delete_completed(&self, user_id: Uuid) -> StoreResult<u64>;
    async fn delete_all(&self, user_id: Uuid) -> StoreResult<u64>;
    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid) -> StoreResult<Vec<ShoppingListItem>>;
    async fn list_completed(&self, user_id: Uuid) -> StoreResult<Vec<ShoppingListItem>>;
}

fn insert_sql() -> String {
    format!(
        "INSERT INTO shopping_list_items (id, user_id, name, quantity, unit, notes,
             custom_category, completed, recipe_id, ingredient_id, created_on, updated_on)
         VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, $8, $9, $10, $10)
         RETURNING {ITEM_COLUMNS}"
    )
}

#[async_trait]
impl ShoppingListRepo for PgStore {
    async fn insert(&self, item: NewShoppingItem) -> StoreResult<ShoppingListItem> {
        let created = self.insert_many(vec![item]).await?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Corrupt("insert returned no row".into()))
    }

    async fn insert_many(&self, items: Vec<NewShoppingItem>) -> StoreResult<Vec<ShoppingListItem>> {
        let sql = insert_sql();
        let now = OffsetDateTime::now_utc();
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(items.len());
        for item in &items {
            let row = sqlx::query_as::<_, ShoppingListItem>(&sql)
                .bind(Uuid::new_v4())
                .bind(item.user_id)
                .bind(&item.name)
                .bind(&item.quantity)
                .bind(&item.unit)
                .bind(&item.notes)
                .bind(&item.custom_category)
                .bind(item.recipe_id)
                .bind(item.ingredient_id)
                .bind(now)
                .fetch_one(&mut *tx)
                .await?;
            created.push(row);
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<ShoppingListItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM shopping_list_items WHERE id = $1");
        let row = sqlx::query_as::<_, ShoppingListItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, c: &ItemChanges) -> StoreResult<Option<ShoppingListItem>> {
        let sql = format!(
            "UPDATE shopping_list_items
                SET name = $2, quantity = $3, unit = $4, notes = $5, custom_category = $6,
                    ingredient_id = $7, updated_on = $8
              WHERE id = $1
          RETURNING {ITEM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ShoppingListItem>(&sql)
            .bind(id)
            .bind(&c.name)
            .bind(&c.quantity)
            .bind(&c.unit)
            .bind(&c.notes)
            .bind(&c.custom_category)
            .bind(c.ingredient_id)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn toggle_completed(&self, id: Uuid) -> StoreResult<Option<ShoppingListItem>> {
        let sql = format!(
            "UPDATE shopping_list_items SET completed = NOT completed, updated_on = $2
              WHERE id = $1
          RETURNING {ITEM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ShoppingListItem>(&sql)
            .bind(id)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn mark_all_completed(&self, user_id: Uuid) -> StoreResult<u64> {
        let done = sqlx::query(
            "UPDATE shopping_list_items SET completed = TRUE, updated_on = $2
              WHERE user_id = $1 AND completed = FALSE",
        )
        .bind(user_id)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let done = sqlx::query("DELETE FROM shopping_list_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() == 1)
    }

    async fn delete_completed(&self, user_id: Uuid) -> StoreResult<u64> {
        let done = sqlx::query(
            "DELETE FROM shopping_list_items WHERE user_id = $1 AND completed = TRUE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected())
    }

    async fn delete_all(&self, user_id: Uuid) -> StoreResult<u64> {
        let done = sqlx::query("DELETE FROM shopping_list_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    async fn list_by_user(&self, user_id: Uuid) -> StoreResult<Vec<ShoppingListItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM shopping_list_items
              WHERE user_id = $1 ORDER BY created_on DESC"
        );
        let rows = sqlx::query_as::<_, ShoppingListItem>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_completed(&self, user_id: Uuid) -> StoreResult<Vec<ShoppingListItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM shopping_list_items
              WHERE user_id = $1 AND completed = TRUE ORDER BY created_on DESC"
        );
        let rows = sqlx::query_as::<_, ShoppingListItem>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

fn new_row(item: NewShoppingItem, now: OffsetDateTime) -> ShoppingListItem {
    ShoppingListItem {
        id: Uuid::new_v4(),
        user_id: item.user_id,
        name: item.name,
        quantity: item.quantity,
        unit: item.unit,
        notes: item.notes,
        custom_category: item.custom_category,
        completed: false,
        recipe_id: item.recipe_id,
        ingredient_id: item.ingredient_id,
        created_on: now,
        updated_on: now,
    }
}

#[async_trait]
impl ShoppingListRepo for MemoryStore {
    async fn insert(&self, item: NewShoppingItem) -> StoreResult<ShoppingListItem> {
        let row = new_row(item, OffsetDateTime::now_utc());
        self.tables()?.shopping_items.push(row.clone());
        Ok(row)
    }

    async fn insert_many(&self, items: Vec<NewShoppingItem>) -> StoreResult<Vec<ShoppingListItem>> {
        let now = OffsetDateTime::now_utc();
        let rows: Vec<ShoppingListItem> = items.into_iter().map(|i| new_row(i, now)).collect();
        self.tables()?.shopping_items.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<ShoppingListItem>> {
        Ok(self
            .tables()?
            .shopping_items
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    async fn update(&self, id: Uuid, c: &ItemChanges) -> StoreResult<Option<ShoppingListItem>> {
        let mut t = self.tables()?;
        let Some(item) = t.shopping_items.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        item.name = c.name.clone();
        item.quantity = c.quantity.clone();
        item.unit = c.unit.clone();
        item.notes = c.notes.clone();
        item.custom_category = c.custom_category.clone();
        item.ingredient_id = c.ingredient_id;
        item.updated_on = OffsetDateTime::now_utc();
        Ok(Some(item.clone()))
    }

    async fn toggle_completed(&self, id: Uuid) -> StoreResult<Option<ShoppingListItem>> {
        let mut t = self.tables()?;
        let Some(item) = t.shopping_items.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        item.completed = !item.completed;
        item.updated_on = OffsetDateTime::now_utc();
        Ok(Some(item.clone()))
    }

    async fn mark_all_completed(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut t = self.tables()?;
        let now = OffsetDateTime::now_utc();
        let mut changed = 0;
        for item in t
            .shopping_items
            .iter_mut()
            .filter(|i| i.user_id == user_id && !i.completed)
        {
            item.completed = true;
            item.updated_on = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables()?;
        let before = t.shopping_items.len();
        t.shopping_items.retain(|i| i.id != id);
        Ok(t.shopping_items.len() < before)
    }

    async fn delete_completed(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut t = self.tables()?;
        let before = t.shopping_items.len();
        t.shopping_items
            .retain(|i| !(i.user_id == user_id && i.completed));
        Ok((before - t.shopping_items.len()) as u64)
    }

    async fn delete_all(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut t = self.tables()?;
        let before = t.shopping_items.len();
        t.shopping_items.retain(|i| i.user_id != user_id);
        Ok((before - t.shopping_items.len()) as u64)
    }

    async fn list_by_user(&self, user_id: Uuid) -> StoreResult<Vec<ShoppingListItem>> {
        let t = self.tables()?;
        let rows = t
            .shopping_items
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned();
        Ok(newest_first(rows, |i| i.created_on))
    }

    async fn list_completed(&self, user_id: Uuid) -> StoreResult<Vec<ShoppingListItem>> {
        let t = self.tables()?;
        let rows = t
            .shopping_items
            .iter()
            .filter(|i| i.user_id == user_id && i.completed)
            .cloned();
        Ok(newest_first(rows, |i| i.created_on))
    }
}
