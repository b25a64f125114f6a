use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod pdf;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(handlers::create_recipe))
        .route(
            "/recipes/:id",
            get(handlers::recipe_page)
                .put(handlers::update_recipe)
                .delete(handlers::delete_recipe),
        )
        .route("/recipes/:id/pdf", get(handlers::download_pdf))
        .route(
            "/recipes/:id/favorite",
            post(handlers::add_favorite).delete(handlers::remove_favorite),
        )
        .route("/me/recipes", get(handlers::my_recipes))
        .route("/me/favorites", get(handlers::my_favorites))
}
