use axum::{routing::get, Router};

use crate::state::AppState;

pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new().route("/ingredients", get(handlers::list_ingredients))
}
