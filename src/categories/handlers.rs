use axum::{
    extract::{Path, State},
    Json,
};
use tracing::instrument;

use crate::categories::dto::CategorySummary;
use crate::categories::services;
use crate::error::AppResult;
use crate::recipes::repo_types::Recipe;
use crate::recipes::services as recipes;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<CategorySummary>>> {
    let categories = services::all_categories(&state).await?;
    let counts = services::category_recipe_counts(&state).await?;
    let body = categories
        .into_iter()
        .map(|c| CategorySummary {
            recipe_count: counts.get(&c.name).copied().unwrap_or(0),
            id: c.id,
            name: c.name,
            description: c.description,
        })
        .collect();
    Ok(Json(body))
}

#[instrument(skip(state))]
pub async fn public_recipes(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<Recipe>>> {
    Ok(Json(recipes::public_recipes(&state, &name).await?))
}
