// handlers/public/incidents.rs - read-only incident views

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::Value;

use crate::database::models::Incident;
use crate::database::AdvancedResults;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::Bare;
use crate::services::IncidentService;
use crate::state::AppState;

/// GET /api/missions/:missionId/incidents - bare array scoped to the mission
pub async fn list(Extension(results): Extension<AdvancedResults>) -> Json<Vec<Value>> {
    Json(results.data)
}

/// GET /api/incidents/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Bare<Incident>, ApiError> {
    let incident = IncidentService::new(&state.db).find(parse_id(&id)?).await?;
    Ok(Bare::ok(incident))
}
