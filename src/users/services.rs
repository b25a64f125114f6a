use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::cache::{read_through, ALL};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::store::StoreError;
use crate::users::repo_types::{AuthPrincipal, NewUser, ProfileUpdate, User, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCounts {
    pub total_users: i64,
    pub admin_count: i64,
    pub user_count: i64,
}

/// Creates a USER account. Username and email must both be unused.
pub async fn register(
    st: &AppState,
    username: &str,
    email: &str,
    password: &str,
) -> AppResult<User> {
    if st.users.username_or_email_taken(username, email).await? {
        warn!(%username, "registration rejected: username or email taken");
        return Err(AppError::UsernameAlreadyExists(username.to_string()));
    }

    let password_hash = hash_password(password)?;
    let user = st
        .users
        .insert(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role: UserRole::User,
        })
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => AppError::UsernameAlreadyExists(username.to_string()),
            other => other.into(),
        })?;

    st.caches.users.invalidate(&ALL);
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

pub async fn get_by_id(st: &AppState, id: Uuid) -> AppResult<User> {
    st.users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::UserNotFound(id.to_string()))
}

pub async fn edit_profile(st: &AppState, user_id: Uuid, profile: ProfileUpdate) -> AppResult<User> {
    let user = st
        .users
        .update_profile(user_id, &profile)
        .await?
        .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;
    st.caches.users.invalidate(&ALL);
    info!(%user_id, "profile updated");
    Ok(user)
}

/// Changes a role; never leaves the system without an ADMIN.
pub async fn change_role(st: &AppState, user_id: Uuid, new_role: UserRole) -> AppResult<User> {
    let user = get_by_id(st, user_id).await?;

    let updated = if new_role == UserRole::User {
        // the admin count and the write happen as one step in the store
        st.users
            .demote_unless_last_admin(user_id)
            .await?
            .ok_or_else(|| {
                warn!(%user_id, "refusing to demote the last admin");
                AppError::LastAdminProtected
            })?
    } else {
        st.users
            .update_role(user_id, new_role)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?
    };
    st.caches.users.invalidate(&ALL);
    info!(%user_id, from = %user.role, to = %new_role, "role changed");
    Ok(updated)
}

pub async fn toggle_active_status(st: &AppState, user_id: Uuid) -> AppResult<User> {
    let user = get_by_id(st, user_id).await?;
    let updated = st
        .users
        .set_active(user_id, !user.active)
        .await?
        .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;
    st.caches.users.invalidate(&ALL);
    info!(%user_id, active = updated.active, "account status toggled");
    Ok(updated)
}

/// Principal lookup for the login flow. Password checks happen in `auth`.
pub async fn authenticate(st: &AppState, username: &str) -> AppResult<AuthPrincipal> {
    st.users
        .find_by_username(username)
        .await?
        .map(AuthPrincipal::from)
        .ok_or_else(|| AppError::UserNotFound(username.to_string()))
}

pub async fn all_users(st: &AppState) -> AppResult<Vec<User>> {
    Ok(read_through(st.caches.users.as_ref(), ALL, || st.users.list_all()).await?)
}

pub async fn user_counts(st: &AppState) -> AppResult<UserCounts> {
    Ok(UserCounts {
        total_users: st.users.count().await?,
        admin_count: st.users.count_by_role(UserRole::Admin).await?,
        user_count: st.users.count_by_role(UserRole::User).await?,
    })
}

/// Seeds the configured admin account into an empty users table.
pub async fn ensure_default_admin(st: &AppState) -> AppResult<Option<User>> {
    let Some(admin) = st.config.default_admin.clone() else {
        return Ok(None);
    };
    if st.users.count().await? > 0 {
        return Ok(None);
    }

    let user = register(st, &admin.username, &admin.email, &admin.password).await?;
    let promoted = change_role(st, user.id, UserRole::Admin).await?;
    info!(user_id = %promoted.id, username = %promoted.username, "default admin created");
    Ok(Some(promoted))
}
