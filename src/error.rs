use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::store::StoreError;
use crate::validation::FieldError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("User [{0}] does not exist.")]
    UserNotFound(String),

    #[error("Recipe with id [{0}] does not exist.")]
    RecipeNotFound(Uuid),

    #[error("Comment with id [{0}] does not exist.")]
    CommentNotFound(Uuid),

    #[error("Shopping list item with id [{0}] not found.")]
    ShoppingListItemNotFound(Uuid),

    #[error("Category '{0}' not found.")]
    CategoryNotFound(String),

    /// Ownership or role mismatch for an authenticated principal.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account [{0}] is blocked.")]
    AccountBlocked(String),

    #[error("Username [{0}] or its email address is already registered.")]
    UsernameAlreadyExists(String),

    #[error("Cannot remove the last admin user!")]
    LastAdminProtected,

    #[error("Unable to add meal to your plan. Please try again.")]
    InvalidMealType(String),

    #[error("{0}")]
    MealPlanningUnavailable(String),

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::UserNotFound(_)
            | AppError::RecipeNotFound(_)
            | AppError::CommentNotFound(_)
            | AppError::ShoppingListItemNotFound(_)
            | AppError::CategoryNotFound(_) => "not_found",
            AppError::Unauthorized(_) | AppError::AccountBlocked(_) => "access_denied",
            AppError::Unauthenticated(_) | AppError::InvalidCredentials => "unauthenticated",
            AppError::UsernameAlreadyExists(_) => "username_already_exists",
            AppError::LastAdminProtected => "last_admin_protected",
            AppError::InvalidMealType(_) => "invalid_meal_type",
            AppError::MealPlanningUnavailable(_) => "meal_planning_unavailable",
            AppError::Validation(_) => "validation",
            AppError::Store(_) | AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UserNotFound(_)
            | AppError::RecipeNotFound(_)
            | AppError::CommentNotFound(_)
            | AppError::ShoppingListItemNotFound(_)
            | AppError::CategoryNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) | AppError::AccountBlocked(_) => StatusCode::FORBIDDEN,
            AppError::Unauthenticated(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::UsernameAlreadyExists(_) | AppError::LastAdminProtected => {
                StatusCode::CONFLICT
            }
            AppError::InvalidMealType(_) => StatusCode::BAD_REQUEST,
            AppError::MealPlanningUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [FieldError]>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Store(_) | AppError::Internal(_) => {
                error!(error = %self, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let fields = match &self {
            AppError::Validation(fields) => Some(fields.as_slice()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.kind(),
            message,
            fields,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let id = Uuid::new_v4();
        let (status, body) = body_json(AppError::RecipeNotFound(id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
        assert!(body["message"].as_str().unwrap().contains(&id.to_string()));
        assert!(body.get("fields").is_none());
    }

    #[tokio::test]
    async fn validation_lists_fields() {
        let err = AppError::Validation(vec![FieldError {
            field: "title",
            message: "Recipe title is required".into(),
        }]);
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"][0]["field"], "title");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let err = AppError::Internal(anyhow::anyhow!("connection refused on 10.0.0.3"));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal");
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn ownership_and_conflicts_have_distinct_statuses() {
        assert_eq!(
            AppError::Unauthorized("nope".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::LastAdminProtected.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::MealPlanningUnavailable("down".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
