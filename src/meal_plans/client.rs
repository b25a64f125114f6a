use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use time::Date;
use uuid::Uuid;

use crate::config::MealPlanningConfig;
use crate::meal_plans::dto::{MealPlanRequest, MealPlanResponse, ISO_DATE};

/// Remote meal-planning service. Every transport or status failure is an `Err`.
#[async_trait]
pub trait MealPlanningClient: Send + Sync {
    async fn add_meal_plan(&self, request: &MealPlanRequest) -> anyhow::Result<MealPlanResponse>;
    async fn weekly_meal_plans(
        &self,
        user_id: Uuid,
        week_start: Date,
    ) -> anyhow::Result<Vec<MealPlanResponse>>;
    async fn delete_meal_plan(&self, meal_plan_id: Uuid, user_id: Uuid) -> anyhow::Result<()>;
}

pub struct HttpMealPlanningClient {
    http: Client,
    base_url: String,
}

impl HttpMealPlanningClient {
    pub fn new(cfg: &MealPlanningConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .context("building meal-planning http client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MealPlanningClient for HttpMealPlanningClient {
    async fn add_meal_plan(&self, request: &MealPlanRequest) -> anyhow::Result<MealPlanResponse> {
        let res = self
            .http
            .post(&self.base_url)
            .json(request)
            .send()
            .await
            .context("POST meal plan")?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    async fn weekly_meal_plans(
        &self,
        user_id: Uuid,
        week_start: Date,
    ) -> anyhow::Result<Vec<MealPlanResponse>> {
        let week_start = week_start.format(ISO_DATE)?;
        let res = self
            .http
            .get(format!("{}/weekly", self.base_url))
            .query(&[("userId", user_id.to_string()), ("weekStart", week_start)])
            .send()
            .await
            .context("GET weekly meal plans")?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    async fn delete_meal_plan(&self, meal_plan_id: Uuid, user_id: Uuid) -> anyhow::Result<()> {
        self.http
            .delete(format!("{}/{}", self.base_url, meal_plan_id))
            .query(&[("userId", user_id.to_string())])
            .send()
            .await
            .context("DELETE meal plan")?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
pub use fake::RecordingMealPlanner;

#[cfg(test)]
mod fake {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Keeps plans in memory. `set_failing(true)` makes every call error.
    #[derive(Default)]
    pub struct RecordingMealPlanner {
        plans: Mutex<Vec<MealPlanResponse>>,
        failing: AtomicBool,
    }

    impl RecordingMealPlanner {
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn plans(&self) -> Vec<MealPlanResponse> {
            self.plans.lock().unwrap().clone()
        }

        pub fn push(&self, plan: MealPlanResponse) {
            self.plans.lock().unwrap().push(plan);
        }

        fn check(&self) -> anyhow::Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                anyhow::bail!("connection refused");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl MealPlanningClient for RecordingMealPlanner {
        async fn add_meal_plan(
            &self,
            request: &MealPlanRequest,
        ) -> anyhow::Result<MealPlanResponse> {
            self.check()?;
            let meal_type = serde_json::to_value(request.meal_type)?
                .as_str()
                .unwrap_or_default()
                .to_string();
            let plan = MealPlanResponse {
                id: Uuid::new_v4(),
                user_id: request.user_id,
                meal_name: request.meal_name.clone(),
                meal_type,
                planned_date: request.planned_date,
                calories: request.calories,
                recipe_id: Some(request.recipe_id),
            };
            self.push(plan.clone());
            Ok(plan)
        }

        async fn weekly_meal_plans(
            &self,
            user_id: Uuid,
            week_start: Date,
        ) -> anyhow::Result<Vec<MealPlanResponse>> {
            self.check()?;
            let week_end = week_start + time::Duration::days(7);
            Ok(self
                .plans()
                .into_iter()
                .filter(|p| p.user_id == user_id)
                .filter(|p| p.planned_date >= week_start && p.planned_date < week_end)
                .collect())
        }

        async fn delete_meal_plan(&self, meal_plan_id: Uuid, user_id: Uuid) -> anyhow::Result<()> {
            self.check()?;
            self.plans
                .lock()
                .unwrap()
                .retain(|p| !(p.id == meal_plan_id && p.user_id == user_id));
            Ok(())
        }
    }
}
