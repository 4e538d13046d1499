//! Authentication handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use validator::Validate;

use super::{ApiResponse, ValidatedJson};
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{Role, User, ADMIN_ONLY};
use crate::services::auth::{AuthTokens, LoginOutcome, RegisterInput};
use crate::services::authorize;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3 to 50 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginOutcome>>> {
    let outcome = state.auth.login(&body.username, &body.password).await?;
    Ok(ApiResponse::data(outcome))
}

/// Exchange a refresh token for a new token pair
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RefreshRequest>,
) -> AppResult<Json<ApiResponse<AuthTokens>>> {
    let tokens = state
        .auth
        .refresh(body.refresh_token.as_deref().unwrap_or_default())
        .await?;
    Ok(ApiResponse::data(tokens))
}

/// Create a staff account (admin only)
pub async fn register(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    authorize(ADMIN_ONLY, Some(&current_user.0))?;

    let user = state
        .auth
        .register(RegisterInput {
            username: body.username,
            password: body.password,
            role: body.role,
        })
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::data(user)))
}

/// The caller's account
pub async fn profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = state.auth.profile(current_user.0.user_id).await?;
    Ok(ApiResponse::data(user))
}

/// Tokens are not revoked; clients discard them
pub async fn logout(current_user: CurrentUser) -> Json<ApiResponse<()>> {
    tracing::info!("User {} logged out", current_user.0.user_id);
    ApiResponse::message("Logged out successfully")
}
