use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::ingredients::services as ingredients;
use crate::recipes::services as recipes;
use crate::shopping::dto::ItemFields;
use crate::shopping::repo_types::{ItemChanges, NewShoppingItem, ShoppingListItem, FROM_RECIPE};
use crate::state::AppState;
use crate::users::repo_types::CurrentUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListStats {
    pub total_items: usize,
    pub completed_items: usize,
    pub recipe_count: usize,
    pub completion_percentage: i64,
}

/// `round(100 * completed / total)`, 0 for an empty list.
pub fn completion_percentage(completed: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as i64
}

pub fn categorize(items: &[ShoppingListItem]) -> BTreeMap<String, Vec<ShoppingListItem>> {
    let mut groups: BTreeMap<String, Vec<ShoppingListItem>> = BTreeMap::new();
    for item in items {
        groups
            .entry(item.display_category().to_string())
            .or_default()
            .push(item.clone());
    }
    groups
}

pub fn distinct_recipes(items: &[ShoppingListItem]) -> usize {
    items
        .iter()
        .filter_map(|i| i.recipe_id)
        .collect::<HashSet<_>>()
        .len()
}

pub fn summarize(items: &[ShoppingListItem]) -> ShoppingListStats {
    let total = items.len();
    let completed = items.iter().filter(|i| i.completed).count();
    ShoppingListStats {
        total_items: total,
        completed_items: completed,
        recipe_count: distinct_recipes(items),
        completion_percentage: completion_percentage(completed, total),
    }
}

/// Links the catalog ingredient of the same name if one exists. Never creates.
async fn catalog_link(st: &AppState, name: &str) -> AppResult<Option<Uuid>> {
    Ok(ingredients::find_by_name_optional(st, name)
        .await?
        .map(|i| i.id))
}

async fn owned_item(st: &AppState, item_id: Uuid, user: &CurrentUser) -> AppResult<ShoppingListItem> {
    let item = st
        .shopping
        .find_by_id(item_id)
        .await?
        .ok_or(AppError::ShoppingListItemNotFound(item_id))?;
    if item.user_id != user.id {
        warn!(%item_id, user_id = %user.id, "shopping item belongs to another user");
        return Err(AppError::Unauthorized(
            "You can only modify your own shopping list items.".into(),
        ));
    }
    Ok(item)
}

pub async fn add_item(st: &AppState, user: &CurrentUser, fields: ItemFields) -> AppResult<ShoppingListItem> {
    let ingredient_id = catalog_link(st, &fields.name).await?;
    let item = st
        .shopping
        .insert(NewShoppingItem {
            user_id: user.id,
            name: fields.name,
            quantity: fields.quantity,
            unit: fields.unit,
            notes: fields.notes,
            custom_category: fields.custom_category,
            recipe_id: None,
            ingredient_id,
        })
        .await?;
    info!(item_id = %item.id, user_id = %user.id, "shopping item added");
    Ok(item)
}

/// One item per ingredient line, tagged "From Recipe".
pub async fn add_ingredients_from_recipe(
    st: &AppState,
    user: &CurrentUser,
    recipe_id: Uuid,
) -> AppResult<Vec<ShoppingListItem>> {
    recipes::get_by_id(st, recipe_id).await?;
    let lines = st.recipes.ingredient_lines(recipe_id).await?;
    if lines.is_empty() {
        warn!(%recipe_id, user_id = %user.id, "recipe has no ingredients to add");
        return Ok(Vec::new());
    }

    let new_items = lines
        .into_iter()
        .map(|line| NewShoppingItem {
            user_id: user.id,
            name: line.ingredient_name,
            quantity: line.quantity,
            unit: line.unit,
            notes: line.notes,
            custom_category: Some(FROM_RECIPE.to_string()),
            recipe_id: Some(recipe_id),
            ingredient_id: Some(line.ingredient_id),
        })
        .collect();
    let created = st.shopping.insert_many(new_items).await?;
    info!(%recipe_id, user_id = %user.id, count = created.len(), "recipe ingredients added to shopping list");
    Ok(created)
}

pub async fn get_item_for_edit(
    st: &AppState,
    item_id: Uuid,
    user: &CurrentUser,
) -> AppResult<ShoppingListItem> {
    owned_item(st, item_id, user).await
}

pub async fn update_item(
    st: &AppState,
    item_id: Uuid,
    user: &CurrentUser,
    fields: ItemFields,
) -> AppResult<ShoppingListItem> {
    let existing = owned_item(st, item_id, user).await?;
    let renamed = existing.name.to_lowercase() != fields.name.to_lowercase();
    let ingredient_id = if renamed {
        catalog_link(st, &fields.name).await?
    } else {
        existing.ingredient_id
    };
    let updated = st
        .shopping
        .update(
            item_id,
            &ItemChanges {
                name: fields.name,
                quantity: fields.quantity,
                unit: fields.unit,
                notes: fields.notes,
                custom_category: fields.custom_category,
                ingredient_id,
            },
        )
        .await?
        .ok_or(AppError::ShoppingListItemNotFound(item_id))?;
    info!(%item_id, user_id = %user.id, renamed, "shopping item updated");
    Ok(updated)
}

pub async fn toggle_item_completion(
    st: &AppState,
    item_id: Uuid,
    user: &CurrentUser,
) -> AppResult<ShoppingListItem> {
    owned_item(st, item_id, user).await?;
    let item = st
        .shopping
        .toggle_completed(item_id)
        .await?
        .ok_or(AppError::ShoppingListItemNotFound(item_id))?;
    info!(%item_id, completed = item.completed, "shopping item toggled");
    Ok(item)
}

pub async fn mark_all_completed(st: &AppState, user: &CurrentUser) -> AppResult<u64> {
    let n = st.shopping.mark_all_completed(user.id).await?;
    info!(user_id = %user.id, count = n, "shopping items marked completed");
    Ok(n)
}

pub async fn delete_item(st: &AppState, item_id: Uuid, user: &CurrentUser) -> AppResult<()> {
    owned_item(st, item_id, user).await?;
    st.shopping.delete(item_id).await?;
    info!(%item_id, user_id = %user.id, "shopping item deleted");
    Ok(())
}

pub async fn remove_completed_items(st: &AppState, user: &CurrentUser) -> AppResult<u64> {
    let n = st.shopping.delete_completed(user.id).await?;
    info!(user_id = %user.id, count = n, "completed shopping items removed");
    Ok(n)
}

pub async fn clear_all_items(st: &AppState, user: &CurrentUser) -> AppResult<u64> {
    let n = st.shopping.delete_all(user.id).await?;
    info!(user_id = %user.id, count = n, "shopping list cleared");
    Ok(n)
}

pub async fn user_items(st: &AppState, user_id: Uuid) -> AppResult<Vec<ShoppingListItem>> {
    Ok(st.shopping.list_by_user(user_id).await?)
}

pub async fn completed_items(st: &AppState, user_id: Uuid) -> AppResult<Vec<ShoppingListItem>> {
    Ok(st.shopping.list_completed(user_id).await?)
}

pub async fn categorized_items(
    st: &AppState,
    user_id: Uuid,
) -> AppResult<BTreeMap<String, Vec<ShoppingListItem>>> {
    Ok(categorize(&user_items(st, user_id).await?))
}

pub async fn stats(st: &AppState, user_id: Uuid) -> AppResult<ShoppingListStats> {
    Ok(summarize(&user_items(st, user_id).await?))
}
