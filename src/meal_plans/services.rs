use std::collections::{HashMap, HashSet};

use time::{Date, Duration, OffsetDateTime};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::meal_plans::dto::{MealPlanRequest, MealPlanResponse, MealType};
use crate::recipes::services as recipes;
use crate::state::AppState;

const ADD_FAILED: &str = "Unable to add meal to your plan. Please try again.";
const DELETE_FAILED: &str = "Unable to delete meal. Please try again.";

/// Monday of the week containing `day`.
pub fn week_start_of(day: Date) -> Date {
    day - Duration::days(i64::from(day.weekday().number_days_from_monday()))
}

pub fn resolve_week_start(week_start: Option<Date>) -> Date {
    week_start.unwrap_or_else(|| week_start_of(OffsetDateTime::now_utc().date()))
}

pub async fn add_recipe_to_meal_plan(
    st: &AppState,
    user_id: Uuid,
    recipe_id: Uuid,
    meal_type: &str,
    planned_date: Date,
) -> AppResult<MealPlanResponse> {
    let recipe = recipes::get_by_id(st, recipe_id).await?;
    let meal_type: MealType = meal_type
        .parse()
        .map_err(|_| AppError::InvalidMealType(meal_type.to_string()))?;

    let request = MealPlanRequest {
        user_id,
        meal_name: recipe.title,
        meal_type,
        planned_date,
        calories: recipe.nutrition.calories,
        recipe_id,
    };
    let plan = st.meal_planner.add_meal_plan(&request).await.map_err(|e| {
        error!(error = %e, %user_id, %recipe_id, "adding meal plan failed");
        AppError::MealPlanningUnavailable(ADD_FAILED.into())
    })?;
    info!(%user_id, %recipe_id, meal_plan_id = %plan.id, "meal planned");
    Ok(plan)
}

/// Remote failures degrade to an empty week.
pub async fn weekly_meal_plans(
    st: &AppState,
    user_id: Uuid,
    week_start: Option<Date>,
) -> Vec<MealPlanResponse> {
    let week_start = resolve_week_start(week_start);
    match st.meal_planner.weekly_meal_plans(user_id, week_start).await {
        Ok(plans) => plans,
        Err(e) => {
            error!(error = %e, %user_id, %week_start, "loading weekly meal plans failed");
            Vec::new()
        }
    }
}

pub async fn delete_meal_plan(st: &AppState, meal_plan_id: Uuid, user_id: Uuid) -> AppResult<()> {
    st.meal_planner
        .delete_meal_plan(meal_plan_id, user_id)
        .await
        .map_err(|e| {
            error!(error = %e, %meal_plan_id, %user_id, "deleting meal plan failed");
            AppError::MealPlanningUnavailable(DELETE_FAILED.into())
        })?;
    info!(%meal_plan_id, %user_id, "meal plan deleted");
    Ok(())
}

/// `true` for recipes that exist locally and are not deleted; unknown ids map to `false`.
pub async fn recipe_availability(
    st: &AppState,
    plans: &[MealPlanResponse],
) -> AppResult<HashMap<Uuid, bool>> {
    let ids: Vec<Uuid> = plans
        .iter()
        .filter_map(|p| p.recipe_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut availability: HashMap<Uuid, bool> = ids.iter().map(|id| (*id, false)).collect();
    for recipe in st.recipes.find_by_ids(&ids).await? {
        availability.insert(recipe.id, !recipe.deleted);
    }
    Ok(availability)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::macros::date;

    use super::*;
    use crate::meal_plans::client::RecordingMealPlanner;
    use crate::testing;

    fn with_planner() -> (AppState, Arc<RecordingMealPlanner>) {
        let planner = Arc::new(RecordingMealPlanner::default());
        let st = AppState::fake().with_meal_planner(planner.clone());
        (st, planner)
    }

    #[test]
    fn week_starts_on_monday() {
        assert_eq!(week_start_of(date!(2026 - 03 - 04)), date!(2026 - 03 - 02));
        assert_eq!(week_start_of(date!(2026 - 03 - 02)), date!(2026 - 03 - 02));
        assert_eq!(week_start_of(date!(2026 - 03 - 08)), date!(2026 - 03 - 02));
        assert_eq!(resolve_week_start(Some(date!(2026 - 01 - 07))), date!(2026 - 01 - 07));
        assert_eq!(
            resolve_week_start(None).weekday(),
            time::Weekday::Monday
        );
    }

    #[tokio::test]
    async fn add_sends_title_and_calories() {
        let (st, planner) = with_planner();
        let alice = testing::user(&st, "alice").await;
        let mut req = testing::recipe_request("Omelette");
        req.nutrition.calories = Some(320);
        let recipe = recipes::create_recipe(&st, &req, &alice).await.unwrap().recipe;

        let plan = add_recipe_to_meal_plan(&st, alice.id, recipe.id, "breakfast", date!(2026 - 03 - 03))
            .await
            .unwrap();
        assert_eq!(plan.meal_name, "Omelette");
        assert_eq!(plan.meal_type, "BREAKFAST");
        assert_eq!(plan.calories, Some(320));
        assert_eq!(planner.plans().len(), 1);
    }

    #[tokio::test]
    async fn add_rejects_unknown_meal_type_and_recipe() {
        let (st, planner) = with_planner();
        let alice = testing::user(&st, "alice").await;
        let recipe = testing::recipe(&st, &alice, "Soup").await;

        let err = add_recipe_to_meal_plan(&st, alice.id, recipe.id, "brunch", date!(2026 - 03 - 03))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidMealType(_)));

        let err = add_recipe_to_meal_plan(&st, alice.id, Uuid::new_v4(), "lunch", date!(2026 - 03 - 03))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RecipeNotFound(_)));
        assert!(planner.plans().is_empty());
    }

    #[tokio::test]
    async fn remote_failures_translate_or_degrade() {
        let (st, planner) = with_planner();
        let alice = testing::user(&st, "alice").await;
        let recipe = testing::recipe(&st, &alice, "Stew").await;
        add_recipe_to_meal_plan(&st, alice.id, recipe.id, "DINNER", date!(2026 - 03 - 04))
            .await
            .unwrap();
        let week = weekly_meal_plans(&st, alice.id, Some(date!(2026 - 03 - 02))).await;
        assert_eq!(week.len(), 1);

        planner.set_failing(true);
        let err = add_recipe_to_meal_plan(&st, alice.id, recipe.id, "DINNER", date!(2026 - 03 - 05))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MealPlanningUnavailable(_)));
        let err = delete_meal_plan(&st, week[0].id, alice.id).await.unwrap_err();
        assert!(matches!(err, AppError::MealPlanningUnavailable(_)));
        assert!(weekly_meal_plans(&st, alice.id, Some(date!(2026 - 03 - 02)))
            .await
            .is_empty());

        planner.set_failing(false);
        delete_meal_plan(&st, week[0].id, alice.id).await.unwrap();
        assert!(planner.plans().is_empty());
    }

    #[tokio::test]
    async fn availability_marks_deleted_and_missing() {
        let (st, _) = with_planner();
        let alice = testing::user(&st, "alice").await;
        let kept = testing::recipe(&st, &alice, "Kept").await;
        let gone = testing::recipe(&st, &alice, "Gone").await;
        recipes::delete_recipe(&st, gone.id, &alice).await.unwrap();
        let missing = Uuid::new_v4();

        let plan = |recipe_id| MealPlanResponse {
            id: Uuid::new_v4(),
            user_id: alice.id,
            meal_name: "x".into(),
            meal_type: "LUNCH".into(),
            planned_date: date!(2026 - 03 - 02),
            calories: None,
            recipe_id: Some(recipe_id),
        };
        let plans = vec![plan(kept.id), plan(gone.id), plan(missing), plan(kept.id)];

        let availability = recipe_availability(&st, &plans).await.unwrap();
        assert_eq!(availability.len(), 3);
        assert_eq!(availability[&kept.id], true);
        assert_eq!(availability[&gone.id], false);
        assert_eq!(availability[&missing], false);
        assert!(recipe_availability(&st, &[]).await.unwrap().is_empty());
    }
}
