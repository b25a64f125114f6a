use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppResult;
use crate::recipes::repo_types::Recipe;
use crate::users::repo_types::{ProfileUpdate, User, UserRole};
use crate::users::services::UserCounts;
use crate::validation::{trimmed, Validator};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub profile_picture: Option<String>,
}

impl ProfileRequest {
    pub fn validate(self) -> AppResult<ProfileUpdate> {
        let update = ProfileUpdate {
            first_name: trimmed(self.first_name),
            last_name: trimmed(self.last_name),
            country: trimmed(self.country),
            profile_picture: trimmed(self.profile_picture),
        };
        Validator::new()
            .max_chars(
                "firstName",
                update.first_name.as_deref(),
                20,
                "First name can't be more than 20 symbols",
            )
            .max_chars(
                "lastName",
                update.last_name.as_deref(),
                20,
                "Last name can't be more than 20 symbols",
            )
            .check(update.country.is_some(), "country", "Country is required")
            .max_chars(
                "country",
                update.country.as_deref(),
                50,
                "Country can't be more than 50 symbols",
            )
            .optional_url("profilePicture", update.profile_picture.as_deref())
            .finish()?;
        Ok(update)
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

impl LimitQuery {
    /// Zero or negative limits mean unbounded.
    pub fn bounded(&self) -> Option<usize> {
        self.limit
            .filter(|&l| l > 0)
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
    }
}

/// Fields of an account that anyone may see.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUserView {
    pub id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub profile_picture: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
}

impl From<&User> for PublicUserView {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            country: u.country.clone(),
            profile_picture: u.profile_picture.clone(),
            created_on: u.created_on,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileResponse {
    pub user: PublicUserView,
    pub recipes: Vec<Recipe>,
    pub recipe_count: usize,
    pub favorite_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboardResponse {
    pub users: Vec<User>,
    #[serde(flatten)]
    pub counts: UserCounts,
}
