use axum::{
    routing::{get, patch, put},
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
        .route("/me/profile", put(handlers::update_profile))
        .route("/users/:id", get(handlers::public_profile))
        .route("/admin", get(handlers::admin_dashboard))
        .route("/admin/users/:id/role", patch(handlers::change_role))
        .route("/admin/users/:id/toggle-status", patch(handlers::toggle_status))
}
