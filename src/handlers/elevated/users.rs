// handlers/elevated/users.rs - user administration
//
// GET/POST   /api
// GET/PUT/DELETE /api/:id

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};

use crate::database::models::{User, UserInput};
use crate::database::AdvancedResults;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{results_envelope, ApiJson, ApiResponse, ApiResult};
use crate::services::UserService;
use crate::state::AppState;

/// GET /api - paginated user list
pub async fn list(Extension(results): Extension<AdvancedResults>) -> Json<Value> {
    results_envelope(results)
}

/// GET /api/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<User> {
    let user = UserService::new(&state.db).find(parse_id(&id)?).await?;
    Ok(ApiResponse::success(user))
}

/// POST /api
pub async fn create(State(state): State<AppState>, ApiJson(input): ApiJson<UserInput>) -> ApiResult<User> {
    let user = UserService::new(&state.db).create(input).await?;
    Ok(ApiResponse::created(user))
}

/// PUT /api/:id - profile fields and role; passwords are not changed here
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<UserInput>,
) -> ApiResult<User> {
    let user = UserService::new(&state.db).update(parse_id(&id)?, input).await?;
    Ok(ApiResponse::success(user))
}

/// DELETE /api/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    UserService::new(&state.db).delete(parse_id(&id)?).await?;
    Ok(ApiResponse::success(json!({})))
}
