use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const FROM_RECIPE: &str = "From Recipe";
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub custom_category: Option<String>,
    pub completed: bool,
    pub recipe_id: Option<Uuid>,
    pub ingredient_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_on: OffsetDateTime,
}

impl ShoppingListItem {
    /// Grouping key: the custom category, or "Uncategorized" when blank.
    pub fn display_category(&self) -> &str {
        match self.custom_category.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => UNCATEGORIZED,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewShoppingItem {
    pub user_id: Uuid,
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub custom_category: Option<String>,
    pub recipe_id: Option<Uuid>,
    pub ingredient_id: Option<Uuid>,
}

/// Editable fields of an item. Ownership and recipe link never change.
#[derive(Debug, Clone)]
pub struct ItemChanges {
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub custom_category: Option<String>,
    pub ingredient_id: Option<Uuid>,
}
