pub mod app;
pub mod auth;
pub mod cache;
pub mod categories;
pub mod comments;
pub mod config;
pub mod error;
pub mod ingredients;
pub mod meal_plans;
pub mod recipes;
pub mod scheduler;
pub mod shopping;
pub mod state;
pub mod store;
pub mod users;
pub mod validation;

#[cfg(test)]
mod testing;
