use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{format_description::FormatItem, macros::format_description, Date};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::recipes::repo_types::Recipe;
use crate::validation::{FieldError, Validator};

pub const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

time::serde::format_description!(iso_date, Date, ISO_DATE);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl FromStr for MealType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BREAKFAST" => Ok(MealType::Breakfast),
            "LUNCH" => Ok(MealType::Lunch),
            "DINNER" => Ok(MealType::Dinner),
            "SNACK" => Ok(MealType::Snack),
            _ => Err(()),
        }
    }
}

/// Body sent to the meal-planning service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanRequest {
    pub user_id: Uuid,
    pub meal_name: String,
    pub meal_type: MealType,
    #[serde(with = "iso_date")]
    pub planned_date: Date,
    pub calories: Option<i32>,
    pub recipe_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meal_name: String,
    pub meal_type: String,
    #[serde(with = "iso_date")]
    pub planned_date: Date,
    pub calories: Option<i32>,
    pub recipe_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMealPlanRequest {
    pub recipe_id: Option<Uuid>,
    pub meal_type: Option<String>,
    pub planned_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidMealPlan {
    pub recipe_id: Uuid,
    pub meal_type: String,
    pub planned_date: Date,
}

impl AddMealPlanRequest {
    /// `today` is the earliest date a meal may be planned for.
    pub fn validate(self, today: Date) -> AppResult<ValidMealPlan> {
        let planned_date = match self.planned_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_date("plannedDate", raw)?),
        };
        let meal_type = self.meal_type.unwrap_or_default();

        Validator::new()
            .check(self.recipe_id.is_some(), "recipeId", "Please select a recipe")
            .required("mealType", &meal_type, "Meal type is required")
            .check(planned_date.is_some(), "plannedDate", "Planned date is required")
            .check(
                planned_date.map_or(true, |d| d >= today),
                "plannedDate",
                "Planned date cannot be in the past",
            )
            .finish()?;

        match (self.recipe_id, planned_date) {
            (Some(recipe_id), Some(planned_date)) => Ok(ValidMealPlan {
                recipe_id,
                meal_type,
                planned_date,
            }),
            _ => Err(AppError::Validation(Vec::new())),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WeekQuery {
    #[serde(alias = "weekStart")]
    pub week_start: Option<String>,
}

impl WeekQuery {
    pub fn parsed(&self) -> AppResult<Option<Date>> {
        match self.week_start.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_date("week_start", raw).map(Some),
        }
    }
}

fn parse_date(field: &'static str, raw: &str) -> AppResult<Date> {
    Date::parse(raw, ISO_DATE).map_err(|_| {
        AppError::Validation(vec![FieldError {
            field,
            message: "Dates must use the YYYY-MM-DD format".into(),
        }])
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyMealPlansResponse {
    #[serde(with = "iso_date")]
    pub week_start: Date,
    pub meal_plans: Vec<MealPlanResponse>,
    pub recipe_availability: HashMap<Uuid, bool>,
    pub user_recipes: Vec<Recipe>,
}
