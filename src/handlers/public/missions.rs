// handlers/public/missions.rs - read-only mission views

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::Value;

use crate::database::AdvancedResults;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{results_envelope, Bare};
use crate::services::MissionService;
use crate::state::AppState;

/// GET /api/missions - paginated list with `incidents` populated
pub async fn list(Extension(results): Extension<AdvancedResults>) -> Json<Value> {
    results_envelope(results)
}

/// GET /api/missions/:id - single mission with its incidents
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Bare<Value>, ApiError> {
    let mission = MissionService::new(&state.db).find_with_incidents(parse_id(&id)?).await?;
    Ok(Bare::ok(mission))
}
