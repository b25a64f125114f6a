use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::comments::repo_types::Comment;
use crate::error::AppResult;
use crate::recipes::repo_types::{DifficultyLevel, Nutrition, RecipeDetails, RecipeDraft};
use crate::validation::{trimmed, Validator};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientLineRequest {
    #[serde(default)]
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub instructions: String,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub serving_size: Option<i32>,
    pub difficulty_level: Option<DifficultyLevel>,
    pub image_url: Option<String>,
    pub is_public: Option<bool>,
    #[serde(flatten)]
    pub nutrition: Nutrition,
    #[serde(default, alias = "categoryNames")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientLineRequest>,
}

fn non_negative(value: Option<f64>) -> bool {
    value.map_or(true, |v| v >= 0.0)
}

impl RecipeRequest {
    /// Field checks run before any write. Returns the trimmed request.
    pub fn validate(mut self) -> AppResult<Self> {
        self.title = self.title.trim().to_string();
        self.instructions = self.instructions.trim().to_string();
        self.description = trimmed(self.description);
        self.image_url = trimmed(self.image_url);

        let n = &self.nutrition;
        Validator::new()
            .required("title", &self.title, "Recipe title is required")
            .max_chars(
                "title",
                Some(&self.title),
                255,
                "Title cannot exceed 255 characters",
            )
            .check(self.description.is_some(), "description", "Description is required")
            .required("instructions", &self.instructions, "Instructions are required")
            .check(
                self.prep_time_minutes.is_some_and(|m| m >= 1),
                "prepTimeMinutes",
                "Preparation time must be at least 1 minute",
            )
            .check(
                self.cook_time_minutes.is_some_and(|m| m >= 0),
                "cookTimeMinutes",
                "Cooking time must be 0 or more minutes",
            )
            .check(
                self.serving_size.is_some_and(|s| s >= 1),
                "servingSize",
                "Serving size must be at least 1",
            )
            .check(
                self.difficulty_level.is_some(),
                "difficultyLevel",
                "Difficulty level is required",
            )
            .optional_url("imageUrl", self.image_url.as_deref())
            .max_chars(
                "imageUrl",
                self.image_url.as_deref(),
                500,
                "Image URL cannot exceed 500 characters",
            )
            .check(
                n.calories.map_or(true, |c| c >= 0),
                "calories",
                "Calories cannot be negative",
            )
            .check(non_negative(n.protein), "protein", "Protein cannot be negative")
            .check(non_negative(n.carbs), "carbs", "Carbs cannot be negative")
            .check(non_negative(n.fat), "fat", "Fat cannot be negative")
            .check(non_negative(n.fiber), "fiber", "Fiber cannot be negative")
            .check(non_negative(n.sugar), "sugar", "Sugar cannot be negative")
            .check(non_negative(n.sodium), "sodium", "Sodium cannot be negative")
            .finish()?;
        Ok(self)
    }

    pub fn to_draft(&self) -> RecipeDraft {
        RecipeDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            instructions: self.instructions.clone(),
            prep_time_minutes: self.prep_time_minutes,
            cook_time_minutes: self.cook_time_minutes,
            serving_size: self.serving_size,
            difficulty_level: self.difficulty_level,
            image_url: self.image_url.clone(),
            is_public: self.is_public.unwrap_or(true),
            nutrition: self.nutrition.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average_rating: Option<f64>,
    pub total_ratings: usize,
}

/// Recipe page: details, comments and viewer-relative flags.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePageResponse {
    pub recipe: RecipeDetails,
    pub rating: RatingSummary,
    pub comments: Vec<Comment>,
    pub favorite_count: usize,
    pub is_author: bool,
    pub is_favorite: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub recipe_id: Uuid,
    pub is_favorite: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn valid() -> RecipeRequest {
        RecipeRequest {
            title: "  Pancakes ".into(),
            description: Some("Fluffy".into()),
            instructions: "Mix and fry".into(),
            prep_time_minutes: Some(10),
            cook_time_minutes: Some(0),
            serving_size: Some(2),
            difficulty_level: Some(DifficultyLevel::Easy),
            image_url: Some("   ".into()),
            is_public: None,
            nutrition: Nutrition::default(),
            categories: vec!["Breakfast".into()],
            ingredients: Vec::new(),
        }
    }

    #[test]
    fn valid_request_defaults_to_public() {
        let req = valid().validate().expect("valid");
        assert_eq!(req.title, "Pancakes");
        assert_eq!(req.image_url, None);
        assert!(req.to_draft().is_public);
    }

    #[test]
    fn numeric_ranges_are_enforced() {
        let mut req = valid();
        req.prep_time_minutes = Some(0);
        req.serving_size = None;
        req.nutrition.fat = Some(-1.0);
        match req.validate() {
            Err(AppError::Validation(fields)) => {
                let names: Vec<_> = fields.iter().map(|f| f.field).collect();
                assert_eq!(names, vec!["prepTimeMinutes", "servingSize", "fat"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_camel_case_payload() {
        let req: RecipeRequest = serde_json::from_value(serde_json::json!({
            "title": "Soup",
            "description": "Warm",
            "instructions": "Boil",
            "prepTimeMinutes": 5,
            "cookTimeMinutes": 20,
            "servingSize": 4,
            "difficultyLevel": "MEDIUM",
            "isPublic": false,
            "calories": 120,
            "categoryNames": ["Soup"],
            "ingredients": [{"name": "Water", "quantity": "1", "unit": "l"}]
        }))
        .unwrap();
        assert_eq!(req.categories, vec!["Soup".to_string()]);
        assert_eq!(req.nutrition.calories, Some(120));
        assert!(!req.to_draft().is_public);
    }
}
