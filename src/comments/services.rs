use tracing::{info, warn};
use uuid::Uuid;

use crate::comments::repo_types::{Comment, NewComment};
use crate::error::{AppError, AppResult};
use crate::recipes::services as recipes;
use crate::state::AppState;
use crate::users::repo_types::CurrentUser;

/// Mean of the ratings, `None` when there are none.
pub fn average_rating(ratings: &[i32]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    Some(sum as f64 / ratings.len() as f64)
}

pub async fn create_comment(
    st: &AppState,
    recipe_id: Uuid,
    content: &str,
    rating: i32,
    author: &CurrentUser,
) -> AppResult<Comment> {
    recipes::get_by_id(st, recipe_id).await?;
    let comment = st
        .comments
        .insert(NewComment {
            recipe_id,
            author_id: author.id,
            content: content.to_string(),
            rating,
        })
        .await?;
    info!(comment_id = %comment.id, %recipe_id, user_id = %author.id, "comment created");
    Ok(comment)
}

pub async fn comments_by_recipe(st: &AppState, recipe_id: Uuid) -> AppResult<Vec<Comment>> {
    Ok(st.comments.list_by_recipe(recipe_id).await?)
}

pub async fn average_rating_for_recipe(st: &AppState, recipe_id: Uuid) -> AppResult<Option<f64>> {
    let ratings: Vec<i32> = comments_by_recipe(st, recipe_id)
        .await?
        .iter()
        .map(|c| c.rating)
        .collect();
    Ok(average_rating(&ratings))
}

/// Every comment carries a rating, so this is the comment count.
pub async fn total_ratings_for_recipe(st: &AppState, recipe_id: Uuid) -> AppResult<usize> {
    Ok(comments_by_recipe(st, recipe_id).await?.len())
}

pub async fn get_by_id(st: &AppState, id: Uuid) -> AppResult<Comment> {
    st.comments
        .find_by_id(id)
        .await?
        .ok_or(AppError::CommentNotFound(id))
}

async fn owned_by(st: &AppState, id: Uuid, user: &CurrentUser, action: &str) -> AppResult<Comment> {
    let comment = get_by_id(st, id).await?;
    if comment.author_id != user.id {
        warn!(comment_id = %id, user_id = %user.id, action, "non-author touched comment");
        return Err(AppError::Unauthorized(format!(
            "You can only {action} your own comments."
        )));
    }
    Ok(comment)
}

pub async fn update_comment(
    st: &AppState,
    id: Uuid,
    content: &str,
    rating: i32,
    user: &CurrentUser,
) -> AppResult<Comment> {
    owned_by(st, id, user, "edit").await?;
    let updated = st
        .comments
        .update(id, content, rating)
        .await?
        .ok_or(AppError::CommentNotFound(id))?;
    info!(comment_id = %id, user_id = %user.id, "comment updated");
    Ok(updated)
}

pub async fn delete_comment(st: &AppState, id: Uuid, user: &CurrentUser) -> AppResult<()> {
    owned_by(st, id, user, "delete").await?;
    st.comments.delete(id).await?;
    info!(comment_id = %id, user_id = %user.id, "comment deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn average_is_the_arithmetic_mean() {
        assert_eq!(average_rating(&[]), None);
        assert_eq!(average_rating(&[4]), Some(4.0));
        assert_eq!(average_rating(&[5, 4, 4]), Some(13.0 / 3.0));
    }

    #[tokio::test]
    async fn ratings_follow_comments() {
        let st = testing::seeded_state().await;
        let alice = testing::user(&st, "alice").await;
        let bob = testing::user(&st, "bob").await;
        let recipe = testing::recipe(&st, &alice, "Chili").await;

        assert_eq!(average_rating_for_recipe(&st, recipe.id).await.unwrap(), None);
        assert_eq!(total_ratings_for_recipe(&st, recipe.id).await.unwrap(), 0);

        create_comment(&st, recipe.id, "Great", 5, &bob).await.unwrap();
        create_comment(&st, recipe.id, "Okay", 2, &alice).await.unwrap();

        assert_eq!(average_rating_for_recipe(&st, recipe.id).await.unwrap(), Some(3.5));
        assert_eq!(total_ratings_for_recipe(&st, recipe.id).await.unwrap(), 2);

        let listed = comments_by_recipe(&st, recipe.id).await.unwrap();
        assert_eq!(listed[0].content, "Okay");
        assert_eq!(listed[0].author_username, "alice");
        assert_eq!(listed[1].author_username, "bob");
    }

    #[tokio::test]
    async fn commenting_on_unknown_recipe_fails() {
        let st = AppState::fake();
        let alice = testing::user(&st, "alice").await;
        let err = create_comment(&st, Uuid::new_v4(), "Hello", 3, &alice)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RecipeNotFound(_)));
    }

    #[tokio::test]
    async fn only_author_edits_or_deletes() {
        let st = testing::seeded_state().await;
        let alice = testing::user(&st, "alice").await;
        let bob = testing::user(&st, "bob").await;
        let recipe = testing::recipe(&st, &alice, "Chili").await;
        let comment = create_comment(&st, recipe.id, "Nice", 4, &bob).await.unwrap();

        let err = update_comment(&st, comment.id, "Hijacked", 1, &alice)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        let err = delete_comment(&st, comment.id, &alice).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(get_by_id(&st, comment.id).await.unwrap().content, "Nice");

        let edited = update_comment(&st, comment.id, "Very nice", 5, &bob)
            .await
            .unwrap();
        assert_eq!(edited.rating, 5);
        assert!(edited.updated_on >= comment.updated_on);

        delete_comment(&st, comment.id, &bob).await.unwrap();
        let err = get_by_id(&st, comment.id).await.unwrap_err();
        assert!(matches!(err, AppError::CommentNotFound(_)));
    }
}
