// handlers/protected/auth.rs - account self-service for the signed-in user
//
// GET /api/v1/auth/me
// PUT /api/v1/auth/updatedetails
// PUT /api/v1/auth/updatepassword

use axum::{extract::State, Extension};

use crate::auth::Principal;
use crate::database::models::User;
use crate::error::ApiError;
use crate::handlers::public::auth::token_response;
use crate::middleware::{ApiJson, ApiResponse, TokenResponse};
use crate::services::accounts::{DetailsInput, PasswordChangeInput};
use crate::services::AccountService;
use crate::state::AppState;

/// GET /api/v1/auth/me
pub async fn me(Extension(principal): Extension<Principal>) -> ApiResponse<User> {
    ApiResponse::success(principal.user)
}

/// PUT /api/v1/auth/updatedetails - name and email only
pub async fn update_details(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(input): ApiJson<DetailsInput>,
) -> Result<ApiResponse<User>, ApiError> {
    let user = AccountService::new(&state.db)
        .update_details(&principal.user, input)
        .await?;
    Ok(ApiResponse::success(user))
}

/// PUT /api/v1/auth/updatepassword - requires the current password, re-issues the token
pub async fn update_password(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(input): ApiJson<PasswordChangeInput>,
) -> Result<TokenResponse, ApiError> {
    let user = AccountService::new(&state.db)
        .update_password(&principal.user, input)
        .await?;
    token_response(&state, &user, "Password updated")
}
