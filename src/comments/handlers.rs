use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use crate::comments::dto::CommentRequest;
use crate::comments::repo_types::Comment;
use crate::comments::services;
use crate::error::AppResult;
use crate::recipes::services as recipes;
use crate::state::AppState;
use crate::users::repo_types::CurrentUser;

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<Json<Vec<Comment>>> {
    recipes::get_by_id(&state, recipe_id).await?;
    Ok(Json(services::comments_by_recipe(&state, recipe_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let valid = payload.validate()?;
    let comment =
        services::create_comment(&state, recipe_id, &valid.content, valid.rating, &user).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[instrument(skip(state, payload))]
pub async fn update_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> AppResult<Json<Comment>> {
    let valid = payload.validate()?;
    let comment =
        services::update_comment(&state, comment_id, &valid.content, valid.rating, &user).await?;
    Ok(Json(comment))
}

#[instrument(skip(state))]
pub async fn delete_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(comment_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_comment(&state, comment_id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}
