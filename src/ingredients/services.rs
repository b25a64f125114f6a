use tracing::debug;

use crate::error::AppResult;
use crate::ingredients::repo_types::Ingredient;
use crate::state::AppState;

/// Catalog key for an ingredient name: trimmed and lowercased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Callers skip blank names before reaching this.
pub async fn find_or_create_ingredient(st: &AppState, name: &str) -> AppResult<Ingredient> {
    let normalized = normalize_name(name);
    let ingredient = st.ingredients.find_or_create(&normalized).await?;
    debug!(ingredient_id = %ingredient.id, name = %ingredient.name, "ingredient resolved");
    Ok(ingredient)
}

pub async fn find_by_name_optional(st: &AppState, name: &str) -> AppResult<Option<Ingredient>> {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
        return Ok(None);
    }
    Ok(st.ingredients.find_by_name(&normalized).await?)
}

pub async fn all_ingredients(st: &AppState) -> AppResult<Vec<Ingredient>> {
    Ok(st.ingredients.list_all().await?)
}
