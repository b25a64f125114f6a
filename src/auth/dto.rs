use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::jwt::TokenPair;
use crate::error::AppResult;
use crate::users::repo_types::{User, UserRole};
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Trims username and email and checks the registration rules.
    pub fn validate(mut self) -> AppResult<Self> {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();
        Validator::new()
            .chars_between(
                "username",
                &self.username,
                3,
                50,
                "Username length must be between 3 and 50 symbols",
            )
            .email("email", &self.email)
            .check(
                self.password.chars().count() >= 6,
                "password",
                "Password must be at least 6 symbols",
            )
            .finish()?;
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(alias = "refresh_token")]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
}

impl AuthResponse {
    pub fn new(tokens: TokenPair, user: &User) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: PublicUser {
                id: user.id,
                username: user.username.clone(),
                role: user.role,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn register_rules() {
        let ok = RegisterRequest {
            username: "  alice ".into(),
            email: "alice@x.com".into(),
            password: "secret1".into(),
        }
        .validate()
        .expect("valid");
        assert_eq!(ok.username, "alice");

        let bad = RegisterRequest {
            username: "al".into(),
            email: "alice".into(),
            password: "12345".into(),
        }
        .validate();
        match bad {
            Err(AppError::Validation(fields)) => assert_eq!(fields.len(), 3),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
