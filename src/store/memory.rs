use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use super::StoreError;
use crate::categories::repo_types::Category;
use crate::comments::repo_types::Comment;
use crate::ingredients::repo_types::Ingredient;
use crate::recipes::repo_types::{Recipe, RecipeIngredientLine};
use crate::shopping::repo_types::ShoppingListItem;
use crate::users::repo_types::User;

/// Row storage for [`MemoryStore`]. Vectors keep insertion order, which the
/// repositories use to break ties between equal timestamps.
#[derive(Default)]
pub(crate) struct Tables {
    pub users: Vec<User>,
    pub categories: Vec<Category>,
    pub ingredients: Vec<Ingredient>,
    pub recipes: Vec<Recipe>,
    /// (recipe_id, category_id)
    pub recipe_categories: Vec<(Uuid, Uuid)>,
    pub recipe_ingredients: Vec<RecipeIngredientLine>,
    /// (user_id, recipe_id)
    pub favorites: Vec<(Uuid, Uuid)>,
    pub comments: Vec<Comment>,
    pub shopping_items: Vec<ShoppingListItem>,
}

/// In-process store used when no database is configured, and by tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

/// Sorts newest first; rows inserted later win ties.
pub(crate) fn newest_first<T>(
    rows: impl DoubleEndedIterator<Item = T>,
    created_on: impl Fn(&T) -> time::OffsetDateTime,
) -> Vec<T> {
    let mut out: Vec<T> = rows.rev().collect();
    out.sort_by(|a, b| created_on(b).cmp(&created_on(a)));
    out
}
