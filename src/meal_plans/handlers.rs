use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::error::AppResult;
use crate::meal_plans::dto::{
    AddMealPlanRequest, MealPlanResponse, WeekQuery, WeeklyMealPlansResponse,
};
use crate::meal_plans::services;
use crate::recipes::services as recipes;
use crate::state::AppState;
use crate::users::repo_types::CurrentUser;

#[instrument(skip(state))]
pub async fn weekly_plans(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<WeekQuery>,
) -> AppResult<Json<WeeklyMealPlansResponse>> {
    let week_start = services::resolve_week_start(query.parsed()?);
    let meal_plans = services::weekly_meal_plans(&state, user.id, Some(week_start)).await;
    let recipe_availability = services::recipe_availability(&state, &meal_plans).await?;
    let user_recipes = recipes::recipes_by_user(&state, user.id, None).await?;
    Ok(Json(WeeklyMealPlansResponse {
        week_start,
        meal_plans,
        recipe_availability,
        user_recipes,
    }))
}

#[instrument(skip(state, payload))]
pub async fn add_meal_plan(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<AddMealPlanRequest>,
) -> AppResult<(StatusCode, Json<MealPlanResponse>)> {
    let plan = payload.validate(OffsetDateTime::now_utc().date())?;
    let created = services::add_recipe_to_meal_plan(
        &state,
        user.id,
        plan.recipe_id,
        &plan.meal_type,
        plan.planned_date,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state))]
pub async fn delete_meal_plan(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(meal_plan_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_meal_plan(&state, meal_plan_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
