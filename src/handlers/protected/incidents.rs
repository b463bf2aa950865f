// handlers/protected/incidents.rs - incident mutations (pilot or commander)

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::Value;

use crate::auth::Principal;
use crate::database::models::{Incident, IncidentInput};
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{message, ApiJson, Bare};
use crate::services::IncidentService;
use crate::state::AppState;

/// POST /api/missions/:missionId/incidents - caller must own the mission or be a commander
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(mission_id): Path<String>,
    ApiJson(input): ApiJson<IncidentInput>,
) -> Result<Bare<Incident>, ApiError> {
    let incident = IncidentService::new(&state.db)
        .create(&principal, parse_id(&mission_id)?, input)
        .await?;
    Ok(Bare::created(incident))
}

/// PUT /api/incidents/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<IncidentInput>,
) -> Result<Bare<Incident>, ApiError> {
    let incident = IncidentService::new(&state.db).update(parse_id(&id)?, input).await?;
    Ok(Bare::ok(incident))
}

/// DELETE /api/incidents/:id - also removes the incident's reports
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    IncidentService::new(&state.db).delete(parse_id(&id)?).await?;
    Ok(message("Incident deleted successfully"))
}
