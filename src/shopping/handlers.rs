use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::AppResult;
use crate::shopping::dto::{AffectedResponse, ShoppingItemRequest, ShoppingListResponse};
use crate::shopping::repo_types::ShoppingListItem;
use crate::shopping::services;
use crate::state::AppState;
use crate::users::repo_types::CurrentUser;

#[instrument(skip(state))]
pub async fn shopping_list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ShoppingListResponse>> {
    let items = services::user_items(&state, user.id).await?;
    Ok(Json(ShoppingListResponse {
        categorized: services::categorize(&items),
        stats: services::summarize(&items),
        items,
    }))
}

#[instrument(skip(state))]
pub async fn completed_items(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<ShoppingListItem>>> {
    Ok(Json(services::completed_items(&state, user.id).await?))
}

#[instrument(skip(state, payload))]
pub async fn add_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<ShoppingItemRequest>,
) -> AppResult<(StatusCode, Json<ShoppingListItem>)> {
    let fields = payload.validate()?;
    let item = services::add_item(&state, &user, fields).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ShoppingListItem>> {
    Ok(Json(services::get_item_for_edit(&state, item_id, &user).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<ShoppingItemRequest>,
) -> AppResult<Json<ShoppingListItem>> {
    let fields = payload.validate()?;
    Ok(Json(services::update_item(&state, item_id, &user, fields).await?))
}

#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_item(&state, item_id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn toggle_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ShoppingListItem>> {
    Ok(Json(services::toggle_item_completion(&state, item_id, &user).await?))
}

#[instrument(skip(state))]
pub async fn add_from_recipe(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<Vec<ShoppingListItem>>)> {
    let items = services::add_ingredients_from_recipe(&state, &user, recipe_id).await?;
    Ok((StatusCode::CREATED, Json(items)))
}

#[instrument(skip(state))]
pub async fn complete_all(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<AffectedResponse>> {
    let affected = services::mark_all_completed(&state, &user).await?;
    Ok(Json(AffectedResponse { affected }))
}

#[instrument(skip(state))]
pub async fn remove_completed(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<AffectedResponse>> {
    let affected = services::remove_completed_items(&state, &user).await?;
    Ok(Json(AffectedResponse { affected }))
}

#[instrument(skip(state))]
pub async fn clear_all(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<AffectedResponse>> {
    let affected = services::clear_all_items(&state, &user).await?;
    Ok(Json(AffectedResponse { affected }))
}
