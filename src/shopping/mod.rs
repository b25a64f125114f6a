use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/shopping-list",
            get(handlers::shopping_list).delete(handlers::clear_all),
        )
        .route("/shopping-list/items", post(handlers::add_item))
        .route(
            "/shopping-list/items/:id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/shopping-list/items/:id/toggle", patch(handlers::toggle_item))
        .route(
            "/shopping-list/from-recipe/:recipe_id",
            post(handlers::add_from_recipe),
        )
        .route("/shopping-list/complete-all", post(handlers::complete_all))
        .route(
            "/shopping-list/completed",
            get(handlers::completed_items).delete(handlers::remove_completed),
        )
}
