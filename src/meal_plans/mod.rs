use axum::{
    routing::{delete, get},
    Router,
};

use crate::state::AppState;

pub mod client;
pub mod dto;
pub mod handlers;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/meal-plans",
            get(handlers::weekly_plans).post(handlers::add_meal_plan),
        )
        .route("/meal-plans/:id", delete(handlers::delete_meal_plan))
}
