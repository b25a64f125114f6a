use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::cache::Caches;
use crate::categories::repo::CategoryRepo;
use crate::comments::repo::CommentRepo;
use crate::config::AppConfig;
use crate::ingredients::repo::IngredientRepo;
use crate::meal_plans::client::{HttpMealPlanningClient, MealPlanningClient};
use crate::recipes::repo::RecipeRepo;
use crate::shopping::repo::ShoppingListRepo;
use crate::store::{MemoryStore, PgStore};
use crate::users::repo::UserRepo;

/// A backend that serves every repository.
pub trait Store:
    UserRepo + CategoryRepo + IngredientRepo + RecipeRepo + CommentRepo + ShoppingListRepo + 'static
{
}

impl<T> Store for T where
    T: UserRepo + CategoryRepo + IngredientRepo + RecipeRepo + CommentRepo + ShoppingListRepo + 'static
{
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub categories: Arc<dyn CategoryRepo>,
    pub ingredients: Arc<dyn IngredientRepo>,
    pub recipes: Arc<dyn RecipeRepo>,
    pub comments: Arc<dyn CommentRepo>,
    pub shopping: Arc<dyn ShoppingListRepo>,
    pub caches: Caches,
    pub meal_planner: Arc<dyn MealPlanningClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let meal_planner = Arc::new(HttpMealPlanningClient::new(&config.meal_planning)?)
            as Arc<dyn MealPlanningClient>;

        let Some(url) = config.database_url.clone() else {
            warn!("DATABASE_URL not set; using the in-memory store, data is lost on restart");
            return Ok(Self::from_store(Arc::new(MemoryStore::new()), config, meal_planner));
        };

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&url)
            .await
            .context("connecting to postgres")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("running migrations")?;
        info!("database ready");

        Ok(Self::from_store(Arc::new(PgStore::new(pool)), config, meal_planner))
    }

    pub fn from_store<S: Store>(
        store: Arc<S>,
        config: Arc<AppConfig>,
        meal_planner: Arc<dyn MealPlanningClient>,
    ) -> Self {
        Self {
            config,
            users: store.clone(),
            categories: store.clone(),
            ingredients: store.clone(),
            recipes: store.clone(),
            comments: store.clone(),
            shopping: store,
            caches: Caches::in_memory(),
            meal_planner,
        }
    }

    pub fn with_meal_planner(mut self, meal_planner: Arc<dyn MealPlanningClient>) -> Self {
        self.meal_planner = meal_planner;
        self
    }

    /// In-memory state with a recording meal planner.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::meal_plans::client::RecordingMealPlanner;

        Self::from_store(
            Arc::new(MemoryStore::new()),
            Arc::new(AppConfig::for_tests()),
            Arc::new(RecordingMealPlanner::default()),
        )
    }
}
