use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::categories::repo_types::Category;
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DifficultyLevel {
    #[serde(alias = "easy", alias = "Easy")]
    Easy,
    #[serde(alias = "medium", alias = "Medium")]
    Medium,
    #[serde(alias = "hard", alias = "Hard")]
    Hard,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Easy => "EASY",
            DifficultyLevel::Medium => "MEDIUM",
            DifficultyLevel::Hard => "HARD",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EASY" => Ok(DifficultyLevel::Easy),
            "MEDIUM" => Ok(DifficultyLevel::Medium),
            "HARD" => Ok(DifficultyLevel::Hard),
            other => Err(StoreError::Corrupt(format!("unknown difficulty `{other}`"))),
        }
    }
}

/// Nutrition facts per serving. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: Option<i32>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub instructions: String,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub serving_size: Option<i32>,
    pub difficulty_level: Option<DifficultyLevel>,
    pub image_url: Option<String>,
    pub is_public: bool,
    #[serde(flatten)]
    pub nutrition: Nutrition,
    pub deleted: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_on: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub instructions: String,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub serving_size: Option<i32>,
    pub difficulty_level: Option<String>,
    pub image_url: Option<String>,
    pub is_public: bool,
    pub calories: Option<i32>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<f64>,
    pub deleted: bool,
    pub created_on: OffsetDateTime,
    pub updated_on: OffsetDateTime,
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = StoreError;

    fn try_from(r: RecipeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            author_id: r.author_id,
            title: r.title,
            description: r.description,
            instructions: r.instructions,
            prep_time_minutes: r.prep_time_minutes,
            cook_time_minutes: r.cook_time_minutes,
            serving_size: r.serving_size,
            difficulty_level: r.difficulty_level.as_deref().map(str::parse).transpose()?,
            image_url: r.image_url,
            is_public: r.is_public,
            nutrition: Nutrition {
                calories: r.calories,
                protein: r.protein,
                carbs: r.carbs,
                fat: r.fat,
                fiber: r.fiber,
                sugar: r.sugar,
                sodium: r.sodium,
            },
            deleted: r.deleted,
            created_on: r.created_on,
            updated_on: r.updated_on,
        })
    }
}

/// Scalar recipe fields written on create and on full replacement.
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub title: String,
    pub description: Option<String>,
    pub instructions: String,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub serving_size: Option<i32>,
    pub difficulty_level: Option<DifficultyLevel>,
    pub image_url: Option<String>,
    pub is_public: bool,
    pub nutrition: Nutrition,
}

/// One ingredient line bound to an already resolved catalog ingredient.
#[derive(Debug, Clone)]
pub struct IngredientLineDraft {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredientLine {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetails {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub author_username: String,
    pub categories: Vec<Category>,
    pub ingredients: Vec<RecipeIngredientLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_accepts_any_case() {
        assert_eq!("hard".parse::<DifficultyLevel>().unwrap(), DifficultyLevel::Hard);
        let parsed: DifficultyLevel = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, DifficultyLevel::Medium);
        assert_eq!(serde_json::to_string(&DifficultyLevel::Easy).unwrap(), "\"EASY\"");
        assert!("extreme".parse::<DifficultyLevel>().is_err());
    }
}
