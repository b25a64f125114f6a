use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};

use crate::auth::dto::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest};
use crate::auth::jwt::{JwtKeys, TokenKind};
use crate::auth::password::password_matches;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::users::repo_types::{CurrentUser, User};
use crate::users::services as users;

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let payload = payload.validate()?;
    let user = users::register(&state, &payload.username, &payload.email, &payload.password).await?;
    let tokens = JwtKeys::from_ref(&state).issue_pair(user.id)?;
    Ok((StatusCode::CREATED, Json(AuthResponse::new(tokens, &user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let username = payload.username.trim();
    let principal = match users::authenticate(&state, username).await {
        Ok(p) => p,
        Err(AppError::UserNotFound(_)) => {
            warn!(%username, "login unknown username");
            return Err(AppError::InvalidCredentials);
        }
        Err(e) => return Err(e),
    };

    if !password_matches(&payload.password, &principal.password_hash)? {
        warn!(user_id = %principal.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }
    if !principal.active {
        warn!(user_id = %principal.id, "login attempt on blocked account");
        return Err(AppError::AccountBlocked(principal.username));
    }

    let user = users::get_by_id(&state, principal.id).await?;
    let tokens = JwtKeys::from_ref(&state).issue_pair(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse::new(tokens, &user)))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify(&payload.refresh_token, TokenKind::Refresh)
        .map_err(|e| {
            warn!(error = %e, "rejected refresh token");
            AppError::Unauthenticated("Invalid or expired refresh token".into())
        })?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("User not found".into()))?;
    if !user.active {
        return Err(AppError::AccountBlocked(user.username));
    }

    let tokens = keys.issue_pair(user.id)?;
    Ok(Json(AuthResponse::new(tokens, &user)))
}

#[instrument(skip(state))]
pub async fn get_me(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<User>> {
    Ok(Json(users::get_by_id(&state, user.id).await?))
}
