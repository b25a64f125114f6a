use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::cache::{read_through, ALL};
use crate::categories::repo_types::Category;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const STARTER_CATEGORIES: [(&str, &str); 9] = [
    ("Breakfast", "Breakfast and morning meals"),
    ("Lunch", "Lunch meals"),
    ("Dinner", "Dinner and main courses"),
    ("Appetizer", "Appetizers and starters"),
    ("Dessert", "Desserts and sweets"),
    ("Snack", "Snacks and quick bites"),
    ("Drink", "Drinks and cocktails"),
    ("Soup", "Soups"),
    ("Salad", "Fresh Salads"),
];

/// Inserts the starter catalog when no category exists yet.
pub async fn seed_defaults(st: &AppState) -> AppResult<usize> {
    if st.categories.count().await? > 0 {
        debug!("categories already present, skipping seed");
        return Ok(0);
    }
    for (name, description) in STARTER_CATEGORIES {
        st.categories.insert(name, description).await?;
    }
    st.caches.categories.invalidate(&ALL);
    info!(count = STARTER_CATEGORIES.len(), "seeded starter categories");
    Ok(STARTER_CATEGORIES.len())
}

pub async fn all_categories(st: &AppState) -> AppResult<Vec<Category>> {
    Ok(read_through(st.caches.categories.as_ref(), ALL, || st.categories.list_all()).await?)
}

/// Resolves names against the closed catalog. Unknown names are dropped.
pub async fn find_categories_by_names(st: &AppState, names: &[String]) -> AppResult<Vec<Category>> {
    let wanted: Vec<String> = names
        .iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }
    let found = st.categories.find_by_names(&wanted).await?;
    debug!(requested = wanted.len(), found = found.len(), "resolved categories");
    Ok(found)
}

pub async fn find_by_name(st: &AppState, name: &str) -> AppResult<Category> {
    st.categories
        .find_by_name(name.trim())
        .await?
        .ok_or_else(|| AppError::CategoryNotFound(name.to_string()))
}

pub async fn category_recipe_counts(st: &AppState) -> AppResult<BTreeMap<String, i64>> {
    let counts = st.categories.recipe_counts().await?;
    Ok(counts
        .into_iter()
        .map(|c| (c.name, c.recipe_count))
        .collect())
}
