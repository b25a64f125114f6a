use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::shopping::repo_types::ShoppingListItem;
use crate::shopping::services::ShoppingListStats;
use crate::validation::{trimmed, Validator};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItemRequest {
    #[serde(default)]
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub custom_category: Option<String>,
}

/// Trimmed item fields, blank optionals mapped to `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub custom_category: Option<String>,
}

impl ShoppingItemRequest {
    pub fn validate(self) -> AppResult<ItemFields> {
        let fields = ItemFields {
            name: self.name.trim().to_string(),
            quantity: trimmed(self.quantity),
            unit: trimmed(self.unit),
            notes: trimmed(self.notes),
            custom_category: trimmed(self.custom_category),
        };
        Validator::new()
            .required("name", &fields.name, "Item name is required")
            .max_chars(
                "name",
                Some(&fields.name),
                100,
                "Item name cannot exceed 100 characters",
            )
            .max_chars(
                "quantity",
                fields.quantity.as_deref(),
                50,
                "Quantity cannot exceed 50 characters",
            )
            .max_chars("unit", fields.unit.as_deref(), 50, "Unit cannot exceed 50 characters")
            .max_chars(
                "notes",
                fields.notes.as_deref(),
                500,
                "Notes cannot exceed 500 characters",
            )
            .max_chars(
                "customCategory",
                fields.custom_category.as_deref(),
                100,
                "Category cannot exceed 100 characters",
            )
            .finish()?;
        Ok(fields)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListResponse {
    pub items: Vec<ShoppingListItem>,
    pub categorized: BTreeMap<String, Vec<ShoppingListItem>>,
    pub stats: ShoppingListStats,
}

#[derive(Debug, Serialize)]
pub struct AffectedResponse {
    pub affected: u64,
}
