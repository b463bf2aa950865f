// handlers/public/auth.rs - token acquisition and password reset
//
// POST /api/v1/auth/register
// POST /api/v1/auth/login
// POST /api/v1/auth/forgotpassword
// PUT  /api/v1/auth/resetpassword/:resettoken

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
};
use serde::Deserialize;

use crate::auth::generate_jwt;
use crate::database::models::{User, UserInput};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, TokenResponse};
use crate::services::accounts::LoginInput;
use crate::services::AccountService;
use crate::state::AppState;

pub const RESET_PATH: &str = "/api/v1/auth/resetpassword";

#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordBody {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordBody {
    pub password: Option<String>,
}

/// Sign a token for `user` and deliver it as body and cookie.
pub(crate) fn token_response(state: &AppState, user: &User, message: &'static str) -> Result<TokenResponse, ApiError> {
    let token = generate_jwt(user.id, &state.config.security)?;
    Ok(TokenResponse::new(token, message, &state.config.security))
}

/// POST /api/v1/auth/register - create an account and sign in
///
/// Body: `{name, email, password, role?}`. Any valid role may be requested.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UserInput>,
) -> Result<TokenResponse, ApiError> {
    let user = AccountService::new(&state.db).register(input).await?;
    token_response(&state, &user, "Register route")
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<TokenResponse, ApiError> {
    let user = AccountService::new(&state.db).login(input).await?;
    tracing::info!("User {} logged in", user.id);
    token_response(&state, &user, "Authentication successful")
}

/// POST /api/v1/auth/forgotpassword - email a single-use reset link
pub async fn forgot_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<ForgotPasswordBody>,
) -> Result<ApiResponse<&'static str>, ApiError> {
    let base_url = reset_base_url(&headers, state.config.api.port);
    AccountService::new(&state.db)
        .forgot_password(
            state.mailer.as_ref(),
            body.email,
            &base_url,
            state.config.security.reset_token_expiry_minutes,
        )
        .await?;

    Ok(ApiResponse::success("Email sent"))
}

/// PUT /api/v1/auth/resetpassword/:resettoken
pub async fn reset_password(
    State(state): State<AppState>,
    Path(reset_token): Path<String>,
    ApiJson(body): ApiJson<ResetPasswordBody>,
) -> Result<TokenResponse, ApiError> {
    let user = AccountService::new(&state.db)
        .reset_password(&reset_token, body.password)
        .await?;
    tracing::info!("Password reset completed for user {}", user.id);
    token_response(&state, &user, "Password reset successful")
}

/// `{proto}://{host}/api/v1/auth/resetpassword`, taken from the request that asked for it.
fn reset_base_url(headers: &HeaderMap, port: u16) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| format!("localhost:{}", port));
    format!("{}://{}{}", scheme, host, RESET_PATH)
}
