use serde::Deserialize;

use crate::error::AppResult;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub content: String,
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidComment {
    pub content: String,
    pub rating: i32,
}

impl CommentRequest {
    pub fn validate(self) -> AppResult<ValidComment> {
        let content = self.content.trim().to_string();
        let rating = self.rating.unwrap_or(0);
        Validator::new()
            .chars_between(
                "content",
                &content,
                2,
                1000,
                "Comment must be between 2 and 1000 characters",
            )
            .check(
                (1..=5).contains(&rating),
                "rating",
                "Rating must be between 1 and 5",
            )
            .finish()?;
        Ok(ValidComment { content, rating })
    }
}
