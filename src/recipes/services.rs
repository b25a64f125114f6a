use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::read_through;
use crate::categories::repo_types::Category;
use crate::categories::services as categories;
use crate::error::{AppError, AppResult};
use crate::ingredients::services as ingredients;
use crate::recipes::dto::{IngredientLineRequest, RecipeRequest};
use crate::recipes::pdf;
use crate::recipes::repo_types::{IngredientLineDraft, Recipe, RecipeDetails};
use crate::state::AppState;
use crate::users::repo_types::CurrentUser;
use crate::users::services as users;
use crate::validation::trimmed;

pub fn is_author(recipe: &Recipe, user_id: Uuid) -> bool {
    recipe.author_id == user_id
}

pub fn is_favorite(favorited_by: &[Uuid], user_id: Uuid) -> bool {
    favorited_by.contains(&user_id)
}

fn category_ids(found: &[Category]) -> Vec<Uuid> {
    found.iter().map(|c| c.id).collect()
}

/// Blank ingredient names are skipped; the rest are found or created.
async fn resolve_lines(
    st: &AppState,
    lines: &[IngredientLineRequest],
) -> AppResult<Vec<IngredientLineDraft>> {
    let mut resolved = Vec::with_capacity(lines.len());
    for line in lines {
        if line.name.trim().is_empty() {
            continue;
        }
        let ingredient = ingredients::find_or_create_ingredient(st, &line.name).await?;
        resolved.push(IngredientLineDraft {
            ingredient_id: ingredient.id,
            ingredient_name: ingredient.name,
            quantity: trimmed(line.quantity.clone()),
            unit: trimmed(line.unit.clone()),
            notes: trimmed(line.notes.clone()),
        });
    }
    Ok(resolved)
}

/// Drops cached listings that may contain this recipe.
async fn invalidate_recipe_views(st: &AppState, recipe: &Recipe) -> AppResult<()> {
    st.caches.user_recipes.invalidate(&recipe.author_id);
    for user_id in st.recipes.favorited_by(recipe.id).await? {
        st.caches.favorites.invalidate(&user_id);
    }
    Ok(())
}

pub async fn create_recipe(
    st: &AppState,
    req: &RecipeRequest,
    author: &CurrentUser,
) -> AppResult<RecipeDetails> {
    let found = categories::find_categories_by_names(st, &req.categories).await?;
    let lines = resolve_lines(st, &req.ingredients).await?;
    let recipe = st
        .recipes
        .insert(author.id, &req.to_draft(), &category_ids(&found), &lines)
        .await?;
    st.caches.user_recipes.invalidate(&author.id);
    info!(recipe_id = %recipe.id, user_id = %author.id, "recipe created");

    let ingredients = st.recipes.ingredient_lines(recipe.id).await?;
    Ok(RecipeDetails {
        recipe,
        author_username: author.username.clone(),
        categories: found,
        ingredients,
    })
}

/// Direct lookup; deleted recipes are still returned.
pub async fn get_by_id(st: &AppState, id: Uuid) -> AppResult<Recipe> {
    st.recipes
        .find_by_id(id)
        .await?
        .ok_or(AppError::RecipeNotFound(id))
}

pub async fn get_details(st: &AppState, id: Uuid) -> AppResult<RecipeDetails> {
    let recipe = get_by_id(st, id).await?;
    let author = users::get_by_id(st, recipe.author_id).await?;
    let categories = st.recipes.categories_of(id).await?;
    let ingredients = st.recipes.ingredient_lines(id).await?;
    Ok(RecipeDetails {
        recipe,
        author_username: author.username,
        categories,
        ingredients,
    })
}

/// Author-only full replacement of fields, categories and ingredient lines.
pub async fn update_recipe(
    st: &AppState,
    id: Uuid,
    req: &RecipeRequest,
    current: &CurrentUser,
) -> AppResult<RecipeDetails> {
    let existing = get_by_id(st, id).await?;
    if !is_author(&existing, current.id) {
        warn!(recipe_id = %id, user_id = %current.id, "non-author tried to edit recipe");
        return Err(AppError::Unauthorized(
            "You can only edit your own recipes.".into(),
        ));
    }

    let found = categories::find_categories_by_names(st, &req.categories).await?;
    let lines = resolve_lines(st, &req.ingredients).await?;
    let recipe = st
        .recipes
        .replace(id, &req.to_draft(), &category_ids(&found), &lines)
        .await?
        .ok_or(AppError::RecipeNotFound(id))?;
    invalidate_recipe_views(st, &recipe).await?;
    info!(recipe_id = %id, user_id = %current.id, "recipe updated");

    let ingredients = st.recipes.ingredient_lines(id).await?;
    Ok(RecipeDetails {
        recipe,
        author_username: current.username.clone(),
        categories: found,
        ingredients,
    })
}

/// Soft delete: the row stays, listings stop showing it.
pub async fn delete_recipe(st: &AppState, id: Uuid, current: &CurrentUser) -> AppResult<()> {
    let existing = get_by_id(st, id).await?;
    if !is_author(&existing, current.id) {
        warn!(recipe_id = %id, user_id = %current.id, "non-author tried to delete recipe");
        return Err(AppError::Unauthorized(
            "You can only delete your own recipes.".into(),
        ));
    }
    let recipe = st
        .recipes
        .mark_deleted(id)
        .await?
        .ok_or(AppError::RecipeNotFound(id))?;
    invalidate_recipe_views(st, &recipe).await?;
    info!(recipe_id = %id, user_id = %current.id, "recipe deleted");
    Ok(())
}

/// Non-deleted recipes by the author, newest first. `None` or `0` is unbounded.
pub async fn recipes_by_user(
    st: &AppState,
    author_id: Uuid,
    limit: Option<usize>,
) -> AppResult<Vec<Recipe>> {
    let mut all = read_through(st.caches.user_recipes.as_ref(), author_id, || {
        st.recipes.list_by_author(author_id)
    })
    .await?;
    if let Some(limit) = limit.filter(|&l| l > 0) {
        all.truncate(limit);
    }
    Ok(all)
}

pub async fn public_recipes(st: &AppState, category_name: &str) -> AppResult<Vec<Recipe>> {
    let category = categories::find_by_name(st, category_name).await?;
    let tagged = st.recipes.list_by_category(category.id).await?;
    Ok(tagged
        .into_iter()
        .filter(|r| r.is_public && !r.deleted)
        .collect())
}

pub async fn add_to_favorites(st: &AppState, user: &CurrentUser, recipe_id: Uuid) -> AppResult<()> {
    get_by_id(st, recipe_id).await?;
    let added = st.recipes.add_favorite(user.id, recipe_id).await?;
    st.caches.favorites.invalidate(&user.id);
    info!(user_id = %user.id, %recipe_id, added, "recipe favorited");
    Ok(())
}

pub async fn remove_from_favorites(
    st: &AppState,
    user: &CurrentUser,
    recipe_id: Uuid,
) -> AppResult<()> {
    get_by_id(st, recipe_id).await?;
    let removed = st.recipes.remove_favorite(user.id, recipe_id).await?;
    st.caches.favorites.invalidate(&user.id);
    info!(user_id = %user.id, %recipe_id, removed, "recipe unfavorited");
    Ok(())
}

/// Favorited, non-deleted recipes, newest first.
pub async fn user_favorites(st: &AppState, user_id: Uuid) -> AppResult<Vec<Recipe>> {
    read_through(st.caches.favorites.as_ref(), user_id, || async {
        users::get_by_id(st, user_id).await?;
        let mut visible: Vec<Recipe> = st
            .recipes
            .favorites_of(user_id)
            .await?
            .into_iter()
            .filter(|r| !r.deleted)
            .collect();
        visible.sort_by(|a, b| b.created_on.cmp(&a.created_on));
        Ok::<_, AppError>(visible)
    })
    .await
}

pub async fn count_user_recipes(st: &AppState, author_id: Uuid) -> AppResult<usize> {
    Ok(recipes_by_user(st, author_id, None).await?.len())
}

pub async fn count_user_favorites(st: &AppState, user_id: Uuid) -> AppResult<usize> {
    Ok(user_favorites(st, user_id).await?.len())
}

pub async fn generate_recipe_pdf(st: &AppState, id: Uuid) -> AppResult<Vec<u8>> {
    let details = get_details(st, id).await?;
    let bytes = pdf::render(&details.recipe.title, &pdf::layout(&details))?;
    info!(recipe_id = %id, size = bytes.len(), "recipe pdf rendered");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn unknown_categories_are_dropped_on_create() {
        let st = testing::seeded_state().await;
        let alice = testing::user(&st, "alice").await;
        let mut req = testing::recipe_request("Club sandwich");
        req.categories = vec!["Lunch".into(), "NoSuchCategory".into()];

        let created = create_recipe(&st, &req, &alice).await.unwrap();
        let names: Vec<_> = created.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Lunch"]);

        let stored = st.recipes.categories_of(created.recipe.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(created.recipe.is_public);
        assert_eq!(created.author_username, "alice");
    }

    #[tokio::test]
    async fn blank_ingredient_lines_are_skipped_and_order_kept() {
        let st = testing::seeded_state().await;
        let alice = testing::user(&st, "alice").await;
        let mut req = testing::recipe_request("Pancakes");
        req.ingredients = vec![
            testing::line("Flour", "200", "g"),
            testing::line("   ", "1", "pc"),
            testing::line(" Milk ", "300", "ml"),
        ];

        let created = create_recipe(&st, &req, &alice).await.unwrap();
        let names: Vec<_> = created
            .ingredients
            .iter()
            .map(|l| l.ingredient_name.as_str())
            .collect();
        assert_eq!(names, vec!["flour", "milk"]);
        assert_eq!(created.ingredients[1].position, 1);
        assert_eq!(st.ingredients.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_replaces_everything_for_author() {
        let st = testing::seeded_state().await;
        let alice = testing::user(&st, "alice").await;
        let mut req = testing::recipe_request("Soup");
        req.categories = vec!["Soup".into()];
        req.ingredients = vec![testing::line("Water", "1", "l")];
        let created = create_recipe(&st, &req, &alice).await.unwrap();

        let mut edit = testing::recipe_request("Better soup");
        edit.categories = vec!["Dinner".into(), "Lunch".into()];
        edit.ingredients = vec![testing::line("Stock", "1", "l"), testing::line("Salt", "1", "tsp")];
        let updated = update_recipe(&st, created.recipe.id, &edit, &alice)
            .await
            .unwrap();

        assert_eq!(updated.recipe.title, "Better soup");
        assert!(updated.recipe.updated_on >= created.recipe.updated_on);
        let details = get_details(&st, created.recipe.id).await.unwrap();
        let cats: Vec<_> = details.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(cats, vec!["Dinner", "Lunch"]);
        let lines: Vec<_> = details
            .ingredients
            .iter()
            .map(|l| l.ingredient_name.as_str())
            .collect();
        assert_eq!(lines, vec!["stock", "salt"]);
    }

    #[tokio::test]
    async fn non_author_update_changes_nothing() {
        let st = testing::seeded_state().await;
        let alice = testing::user(&st, "alice").await;
        let bob = testing::user(&st, "bob").await;
        let created = create_recipe(&st, &testing::recipe_request("Tart"), &alice)
            .await
            .unwrap();

        let err = update_recipe(&st, created.recipe.id, &testing::recipe_request("Mine now"), &bob)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        let stored = get_by_id(&st, created.recipe.id).await.unwrap();
        assert_eq!(stored, created.recipe);
    }

    #[tokio::test]
    async fn non_author_delete_is_rejected() {
        let st = testing::seeded_state().await;
        let alice = testing::user(&st, "alice").await;
        let bob = testing::user(&st, "bob").await;
        let created = create_recipe(&st, &testing::recipe_request("Tart"), &alice)
            .await
            .unwrap();

        let err = delete_recipe(&st, created.recipe.id, &bob).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(!get_by_id(&st, created.recipe.id).await.unwrap().deleted);
    }

    #[tokio::test]
    async fn soft_delete_hides_from_listings_but_not_lookup() {
        let st = testing::seeded_state().await;
        let alice = testing::user(&st, "alice").await;
        let mut req = testing::recipe_request("Salad");
        req.categories = vec!["Salad".into()];
        let created = create_recipe(&st, &req, &alice).await.unwrap();
        let id = created.recipe.id;

        assert_eq!(recipes_by_user(&st, alice.id, None).await.unwrap().len(), 1);
        assert_eq!(public_recipes(&st, "Salad").await.unwrap().len(), 1);
        add_to_favorites(&st, &alice, id).await.unwrap();
        assert_eq!(user_favorites(&st, alice.id).await.unwrap().len(), 1);

        delete_recipe(&st, id, &alice).await.unwrap();

        assert!(get_by_id(&st, id).await.unwrap().deleted);
        assert!(recipes_by_user(&st, alice.id, None).await.unwrap().is_empty());
        assert!(public_recipes(&st, "Salad").await.unwrap().is_empty());
        assert!(user_favorites(&st, alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_limit_truncates() {
        let st = testing::seeded_state().await;
        let alice = testing::user(&st, "alice").await;
        for title in ["first", "second", "third"] {
            create_recipe(&st, &testing::recipe_request(title), &alice)
                .await
                .unwrap();
        }
        let titles = |rs: Vec<Recipe>| rs.into_iter().map(|r| r.title).collect::<Vec<_>>();

        let all = recipes_by_user(&st, alice.id, None).await.unwrap();
        assert_eq!(titles(all), vec!["third", "second", "first"]);
        let two = recipes_by_user(&st, alice.id, Some(2)).await.unwrap();
        assert_eq!(titles(two), vec!["third", "second"]);
        assert_eq!(recipes_by_user(&st, alice.id, Some(0)).await.unwrap().len(), 3);
        assert_eq!(count_user_recipes(&st, alice.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn public_listing_skips_private_recipes() {
        let st = testing::seeded_state().await;
        let alice = testing::user(&st, "alice").await;
        let mut shown = testing::recipe_request("Shown");
        shown.categories = vec!["Dessert".into()];
        let mut hidden = testing::recipe_request("Hidden");
        hidden.categories = vec!["Dessert".into()];
        hidden.is_public = Some(false);
        create_recipe(&st, &shown, &alice).await.unwrap();
        create_recipe(&st, &hidden, &alice).await.unwrap();

        let listed = public_recipes(&st, "Dessert").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Shown");

        let err = public_recipes(&st, "Brunch").await.unwrap_err();
        assert!(matches!(err, AppError::CategoryNotFound(_)));
    }

    #[tokio::test]
    async fn favorites_are_idempotent_and_reversible() {
        let st = testing::seeded_state().await;
        let alice = testing::user(&st, "alice").await;
        let bob = testing::user(&st, "bob").await;
        let recipe = create_recipe(&st, &testing::recipe_request("Stew"), &alice)
            .await
            .unwrap()
            .recipe;

        add_to_favorites(&st, &bob, recipe.id).await.unwrap();
        add_to_favorites(&st, &bob, recipe.id).await.unwrap();
        assert_eq!(user_favorites(&st, bob.id).await.unwrap().len(), 1);
        let fans = st.recipes.favorited_by(recipe.id).await.unwrap();
        assert_eq!(fans, vec![bob.id]);
        assert!(is_favorite(&fans, bob.id));

        remove_from_favorites(&st, &bob, recipe.id).await.unwrap();
        assert!(user_favorites(&st, bob.id).await.unwrap().is_empty());
        assert!(st.recipes.favorited_by(recipe.id).await.unwrap().is_empty());
        assert_eq!(count_user_favorites(&st, bob.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn author_edit_refreshes_fans_cached_favorites() {
        let st = testing::seeded_state().await;
        let alice = testing::user(&st, "alice").await;
        let bob = testing::user(&st, "bob").await;
        let recipe = create_recipe(&st, &testing::recipe_request("Old title"), &alice)
            .await
            .unwrap()
            .recipe;
        add_to_favorites(&st, &bob, recipe.id).await.unwrap();
        assert_eq!(user_favorites(&st, bob.id).await.unwrap()[0].title, "Old title");

        update_recipe(&st, recipe.id, &testing::recipe_request("New title"), &alice)
            .await
            .unwrap();
        assert_eq!(user_favorites(&st, bob.id).await.unwrap()[0].title, "New title");
    }

    #[tokio::test]
    async fn favorites_of_unknown_user() {
        let st = AppState::fake();
        let err = user_favorites(&st, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn favoriting_unknown_recipe_fails() {
        let st = AppState::fake();
        let alice = testing::user(&st, "alice").await;
        let err = add_to_favorites(&st, &alice, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::RecipeNotFound(_)));
    }

    #[tokio::test]
    async fn pdf_export() {
        let st = testing::seeded_state().await;
        let alice = testing::user(&st, "alice").await;
        let recipe = create_recipe(&st, &testing::recipe_request("Printable"), &alice)
            .await
            .unwrap()
            .recipe;
        let bytes = generate_recipe_pdf(&st, recipe.id).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let err = generate_recipe_pdf(&st, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::RecipeNotFound(_)));
    }

    #[test]
    fn predicates_compare_ids() {
        let author = Uuid::new_v4();
        let other = Uuid::new_v4();
        let recipe = testing::bare_recipe(author);
        assert!(is_author(&recipe, author));
        assert!(!is_author(&recipe, other));
        assert!(!is_favorite(&[author], other));
    }
}
