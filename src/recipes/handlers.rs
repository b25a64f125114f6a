use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use crate::comments::services as comments;
use crate::error::AppResult;
use crate::recipes::dto::{FavoriteResponse, RatingSummary, RecipePageResponse, RecipeRequest};
use crate::recipes::repo_types::{Recipe, RecipeDetails};
use crate::recipes::services;
use crate::state::AppState;
use crate::users::dto::LimitQuery;
use crate::users::repo_types::CurrentUser;

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<RecipeRequest>,
) -> AppResult<(StatusCode, Json<RecipeDetails>)> {
    let req = payload.validate()?;
    let created = services::create_recipe(&state, &req, &user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state))]
pub async fn recipe_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<Json<RecipePageResponse>> {
    let recipe = services::get_details(&state, recipe_id).await?;
    let comments = comments::comments_by_recipe(&state, recipe_id).await?;
    let ratings: Vec<i32> = comments.iter().map(|c| c.rating).collect();
    let fans = state.recipes.favorited_by(recipe_id).await?;
    Ok(Json(RecipePageResponse {
        is_author: services::is_author(&recipe.recipe, user.id),
        is_favorite: services::is_favorite(&fans, user.id),
        favorite_count: fans.len(),
        rating: RatingSummary {
            average_rating: comments::average_rating(&ratings),
            total_ratings: ratings.len(),
        },
        recipe,
        comments,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
    Json(payload): Json<RecipeRequest>,
) -> AppResult<Json<RecipeDetails>> {
    let req = payload.validate()?;
    Ok(Json(services::update_recipe(&state, recipe_id, &req, &user).await?))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_recipe(&state, recipe_id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn download_pdf(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let bytes = services::generate_recipe_pdf(&state, recipe_id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"recipe.pdf\""),
        ],
        bytes::Bytes::from(bytes),
    ))
}

#[instrument(skip(state))]
pub async fn add_favorite(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<Json<FavoriteResponse>> {
    services::add_to_favorites(&state, &user, recipe_id).await?;
    Ok(Json(FavoriteResponse {
        recipe_id,
        is_favorite: true,
    }))
}

#[instrument(skip(state))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<Json<FavoriteResponse>> {
    services::remove_from_favorites(&state, &user, recipe_id).await?;
    Ok(Json(FavoriteResponse {
        recipe_id,
        is_favorite: false,
    }))
}

#[instrument(skip(state))]
pub async fn my_recipes(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<Recipe>>> {
    Ok(Json(services::recipes_by_user(&state, user.id, query.bounded()).await?))
}

#[instrument(skip(state))]
pub async fn my_favorites(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Recipe>>> {
    Ok(Json(services::user_favorites(&state, user.id).await?))
}
