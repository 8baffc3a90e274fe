use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    response::Response,
    Json,
};

use crate::identity::SignIn;
use crate::models::{ProfileUpdate, User};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{empty_success, success};

/// The authenticated caller, resolved from `Authorization: Bearer <token>`.
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::AuthError("Missing bearer token".to_string()))?;

        let user = state
            .identity
            .current_user(token)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid or expired session".to_string()))?;

        Ok(CurrentUser {
            user,
            token: token.to_string(),
        })
    }
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(credentials): Json<SignIn>,
) -> Result<Response, AppError> {
    let session = state.identity.sign_in(credentials, state.clock.now()).await?;
    tracing::info!(uid = %session.user.uid, "User signed in");
    Ok(success(session, "Signed in"))
}

pub async fn sign_out(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    state.identity.sign_out(&current.token).await?;
    tracing::info!(uid = %current.user.uid, "User signed out");
    Ok(empty_success("Signed out"))
}

pub async fn get_profile(current: CurrentUser) -> Response {
    success(current.user, "Profile retrieved")
}

pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Response, AppError> {
    if update
        .display_name
        .as_deref()
        .is_some_and(|name| name.trim().is_empty())
    {
        return Err(AppError::ValidationError(
            "Display name must not be empty".to_string(),
        ));
    }

    let user = state
        .identity
        .update_profile(&current.user.uid, update)
        .await?;
    Ok(success(user, "Profile updated"))
}
