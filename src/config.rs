use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use time::Time;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct MealPlanningConfig {
    pub base_url: String,
    pub timeout: Duration,
}

/// Account created on first start when the users table is empty.
#[derive(Clone)]
pub struct DefaultAdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for DefaultAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultAdminConfig")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub daily_report_at: Time,
    pub coverage_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub meal_planning: MealPlanningConfig,
    pub default_admin: Option<DefaultAdminConfig>,
    pub scheduler: SchedulerConfig,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: var_or("JWT_ISSUER", "recipehub"),
            audience: var_or("JWT_AUDIENCE", "recipehub-users"),
            ttl_minutes: parsed_or("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: parsed_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let meal_planning = MealPlanningConfig {
            base_url: var_or("MEAL_PLANNING_URL", "http://localhost:8081/api/v1/meal-plans"),
            timeout: Duration::from_secs(parsed_or("MEAL_PLANNING_TIMEOUT_SECS", 5)),
        };
        let default_admin = match (
            std::env::var("DEFAULT_ADMIN_USERNAME"),
            std::env::var("DEFAULT_ADMIN_EMAIL"),
            std::env::var("DEFAULT_ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(email), Ok(password)) => Some(DefaultAdminConfig {
                username,
                email,
                password,
            }),
            _ => None,
        };
        let report_hour: u8 = parsed_or("REPORT_DAILY_HOUR", 2);
        let scheduler = SchedulerConfig {
            enabled: parsed_or("SCHEDULER_ENABLED", true),
            daily_report_at: Time::from_hms(report_hour, 0, 0)
                .context("REPORT_DAILY_HOUR must be between 0 and 23")?,
            coverage_interval: Duration::from_secs(parsed_or("COVERAGE_INTERVAL_SECS", 1800)),
        };
        Ok(Self {
            database_url,
            host: var_or("APP_HOST", "0.0.0.0"),
            port: parsed_or("APP_PORT", 8080),
            jwt,
            meal_planning,
            default_admin,
            scheduler,
        })
    }

    /// Configuration used by tests and `AppState::fake()`.
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            host: "127.0.0.1".into(),
            port: 0,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            meal_planning: MealPlanningConfig {
                base_url: "http://meal-planning.test/api/v1/meal-plans".into(),
                timeout: Duration::from_secs(1),
            },
            default_admin: None,
            scheduler: SchedulerConfig {
                enabled: false,
                daily_report_at: time::macros::time!(2:00),
                coverage_interval: Duration::from_secs(1800),
            },
        }
    }
}
