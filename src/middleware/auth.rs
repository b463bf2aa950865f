use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{decode_jwt, AuthError, Principal, NOT_AUTHORIZED};
use crate::database::models::Role;
use crate::error::ApiError;
use crate::services::AccountService;
use crate::state::AppState;

pub const TOKEN_COOKIE: &str = "token";

pub const PILOT_OR_COMMANDER: &[Role] = &[Role::Pilot, Role::Commander];
pub const COMMANDER_ONLY: &[Role] = &[Role::Commander];

/// Verify the bearer (or cookie) token and attach the user as a [`Principal`].
/// No handler runs when this fails.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers()).ok_or(AuthError::MissingToken)?;
    let claims = decode_jwt(&token, &state.config.security).map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        e
    })?;

    let user = AccountService::new(&state.db)
        .principal_user(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized(NOT_AUTHORIZED))?;

    request.extensions_mut().insert(Principal::from(user));
    Ok(next.run(request).await)
}

/// Allow only principals whose role is in `roles`. Must run after [`authenticate`].
pub async fn authorize(roles: &'static [Role], request: Request, next: Next) -> Result<Response, ApiError> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| ApiError::unauthorized(NOT_AUTHORIZED))?;

    if !roles.contains(&principal.role) {
        return Err(ApiError::forbidden(format!(
            "User role {} is not authorized to access this route",
            principal.role
        )));
    }
    Ok(next.run(request).await)
}

/// `Authorization: Bearer <token>` first, then the `token` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn prefers_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("token=xyz"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn falls_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; token=xyz"));
        assert_eq!(extract_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn missing_or_empty_tokens_are_none() {
        assert_eq!(extract_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        headers.insert(header::COOKIE, HeaderValue::from_static("token="));
        assert_eq!(extract_token(&headers), None);
    }
}
