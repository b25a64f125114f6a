use axum::{extract::State, Json};
use tracing::instrument;

use crate::error::AppResult;
use crate::ingredients::repo_types::Ingredient;
use crate::ingredients::services;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn list_ingredients(State(state): State<AppState>) -> AppResult<Json<Vec<Ingredient>>> {
    Ok(Json(services::all_ingredients(&state).await?))
}
