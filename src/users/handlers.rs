use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::extractors::AdminUser;
use crate::error::AppResult;
use crate::recipes::services as recipes;
use crate::state::AppState;
use crate::users::dto::{
    AdminDashboardResponse, ChangeRoleRequest, LimitQuery, ProfileRequest, PublicProfileResponse,
    PublicUserView,
};
use crate::users::repo_types::{CurrentUser, User};
use crate::users::services;

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<ProfileRequest>,
) -> AppResult<Json<User>> {
    let update = payload.validate()?;
    let updated = services::edit_profile(&state, user.id, update).await?;
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn public_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<PublicProfileResponse>> {
    let user = services::get_by_id(&state, user_id).await?;
    let recipes_shown = recipes::recipes_by_user(&state, user_id, query.bounded()).await?;
    let recipe_count = recipes::count_user_recipes(&state, user_id).await?;
    let favorite_count = recipes::count_user_favorites(&state, user_id).await?;
    Ok(Json(PublicProfileResponse {
        user: PublicUserView::from(&user),
        recipes: recipes_shown,
        recipe_count,
        favorite_count,
    }))
}

#[instrument(skip(state))]
pub async fn admin_dashboard(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<AdminDashboardResponse>> {
    let users = services::all_users(&state).await?;
    let counts = services::user_counts(&state).await?;
    Ok(Json(AdminDashboardResponse { users, counts }))
}

#[instrument(skip(state, payload))]
pub async fn change_role(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ChangeRoleRequest>,
) -> AppResult<Json<User>> {
    let user = services::change_role(&state, user_id, payload.role).await?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn toggle_status(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<User>> {
    let user = services::toggle_active_status(&state, user_id).await?;
    Ok(Json(user))
}
