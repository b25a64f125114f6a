//! Fixtures shared by the unit tests.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::categories::services::seed_defaults;
use crate::recipes::dto::{IngredientLineRequest, RecipeRequest};
use crate::recipes::repo_types::{DifficultyLevel, Nutrition, Recipe};
use crate::recipes::services::create_recipe;
use crate::state::AppState;
use crate::users::repo_types::{CurrentUser, NewUser, UserRole};

const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$aGFzaA";

async fn insert(st: &AppState, name: &str, role: UserRole) -> CurrentUser {
    let user = st
        .users
        .insert(NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: DUMMY_HASH.to_string(),
            role,
        })
        .await
        .expect("insert user");
    CurrentUser::from(&user)
}

pub async fn user(st: &AppState, name: &str) -> CurrentUser {
    insert(st, name, UserRole::User).await
}

pub async fn admin(st: &AppState, name: &str) -> CurrentUser {
    insert(st, name, UserRole::Admin).await
}

pub async fn seeded_state() -> AppState {
    let st = AppState::fake();
    seed_defaults(&st).await.expect("seed categories");
    st
}

/// A request that passes validation, without categories or ingredients.
pub fn recipe_request(title: &str) -> RecipeRequest {
    RecipeRequest {
        title: title.to_string(),
        description: Some(format!("{title} the easy way")),
        instructions: "Mix everything. Cook until done.".into(),
        prep_time_minutes: Some(10),
        cook_time_minutes: Some(20),
        serving_size: Some(2),
        difficulty_level: Some(DifficultyLevel::Easy),
        image_url: None,
        is_public: None,
        nutrition: Nutrition::default(),
        categories: Vec::new(),
        ingredients: Vec::new(),
    }
}

pub fn line(name: &str, quantity: &str, unit: &str) -> IngredientLineRequest {
    IngredientLineRequest {
        name: name.to_string(),
        quantity: Some(quantity.to_string()),
        unit: Some(unit.to_string()),
        notes: None,
    }
}

pub async fn recipe(st: &AppState, author: &CurrentUser, title: &str) -> Recipe {
    create_recipe(st, &recipe_request(title), author)
        .await
        .expect("create recipe")
        .recipe
}

/// A recipe record that was never stored.
pub fn bare_recipe(author_id: Uuid) -> Recipe {
    let now = OffsetDateTime::now_utc();
    Recipe {
        id: Uuid::new_v4(),
        author_id,
        title: "Untitled".into(),
        description: None,
        instructions: "Do the thing.".into(),
        prep_time_minutes: Some(5),
        cook_time_minutes: Some(0),
        serving_size: Some(1),
        difficulty_level: Some(DifficultyLevel::Easy),
        image_url: None,
        is_public: true,
        nutrition: Nutrition::default(),
        deleted: false,
        created_on: now,
        updated_on: now,
    }
}
