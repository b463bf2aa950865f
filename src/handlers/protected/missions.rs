// handlers/protected/missions.rs - mission mutations
//
// Creation only needs an authenticated principal; update and delete are
// restricted to the owner or a commander.

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::Value;

use crate::auth::Principal;
use crate::database::models::{Mission, MissionInput};
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{message, ApiJson, Bare};
use crate::services::MissionService;
use crate::state::AppState;

/// POST /api/missions
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(input): ApiJson<MissionInput>,
) -> Result<Bare<Mission>, ApiError> {
    let mission = MissionService::new(&state.db).create(&principal, input).await?;
    Ok(Bare::created(mission))
}

/// PUT /api/missions/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<MissionInput>,
) -> Result<Bare<Mission>, ApiError> {
    let mission = MissionService::new(&state.db)
        .update(&principal, parse_id(&id)?, input)
        .await?;
    Ok(Bare::ok(mission))
}

/// DELETE /api/missions/:id - removes the mission, its incidents and their reports
pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    MissionService::new(&state.db).delete(&principal, parse_id(&id)?).await?;
    Ok(message("Mission deleted successfully"))
}
