use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::SecurityConfig;
use crate::database::AdvancedResults;

/// Wrapper for API responses that automatically adds success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: None,
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self {
            data,
            status_code: Some(StatusCode::CREATED),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => return serialization_failure(e),
        };

        (status, Json(json!({ "success": true, "data": data_value }))).into_response()
    }
}

/// Resource serialized as-is, without the success envelope.
#[derive(Debug)]
pub struct Bare<T: Serialize>(pub StatusCode, pub T);

impl<T: Serialize> Bare<T> {
    pub fn ok(data: T) -> Self {
        Self(StatusCode::OK, data)
    }

    pub fn created(data: T) -> Self {
        Self(StatusCode::CREATED, data)
    }
}

impl<T: Serialize> IntoResponse for Bare<T> {
    fn into_response(self) -> Response {
        match serde_json::to_value(&self.1) {
            Ok(value) => (self.0, Json(value)).into_response(),
            Err(e) => serialization_failure(e),
        }
    }
}

/// `{success: true, count, data, pagination}` for paginated lists.
pub fn results_envelope(results: AdvancedResults) -> Json<Value> {
    Json(json!({
        "success": true,
        "count": results.count,
        "data": results.data,
        "pagination": results.pagination,
    }))
}

/// `{message}` acknowledgement used by deletes.
pub fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}

/// Token delivered both in the body and as an http-only cookie.
pub struct TokenResponse {
    pub token: String,
    pub message: &'static str,
    pub cookie_expire_days: i64,
    pub secure: bool,
}

impl TokenResponse {
    pub fn new(token: String, message: &'static str, security: &SecurityConfig) -> Self {
        Self {
            token,
            message,
            cookie_expire_days: security.cookie_expire_days,
            secure: security.secure_cookies,
        }
    }

    pub fn cookie(&self) -> String {
        let expires = Utc::now() + Duration::days(self.cookie_expire_days);
        let mut cookie = format!(
            "{}={}; Path=/; Expires={}; HttpOnly",
            crate::middleware::auth::TOKEN_COOKIE,
            self.token,
            expires.format("%a, %d %b %Y %H:%M:%S GMT")
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

impl IntoResponse for TokenResponse {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": true,
            "token": self.token,
            "message": self.message,
        }));

        match HeaderValue::from_str(&self.cookie()) {
            Ok(cookie) => (StatusCode::OK, [(header::SET_COOKIE, cookie)], body).into_response(),
            Err(e) => {
                tracing::error!("Invalid token cookie: {}", e);
                (StatusCode::OK, body).into_response()
            }
        }
    }
}

fn serialization_failure(e: serde_json::Error) -> Response {
    tracing::error!("Failed to serialize response data: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": "Failed to serialize response data",
            "message": "Failed to serialize response data"
        })),
    )
        .into_response()
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
