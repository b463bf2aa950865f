// handlers/public/reports.rs - read-only report and attachment views

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};

use crate::database::models::{Report, ReportFile};
use crate::database::AdvancedResults;
use crate::error::ApiError;
use crate::handlers::ReportPath;
use crate::middleware::Bare;
use crate::services::ReportService;
use crate::state::AppState;

/// GET .../incidents/:incidentId/reports - bare array scoped to the incident
pub async fn list(Extension(results): Extension<AdvancedResults>) -> Json<Vec<Value>> {
    Json(results.data)
}

/// GET .../reports/:reportId
pub async fn show(State(state): State<AppState>, Path(path): Path<ReportPath>) -> Result<Bare<Report>, ApiError> {
    let report = ReportService::new(&state.db).find(path.report()?).await?;
    Ok(Bare::ok(report))
}

/// GET .../reports/:reportId/files
pub async fn files(State(state): State<AppState>, Path(path): Path<ReportPath>) -> Result<Json<Value>, ApiError> {
    let files = ReportService::new(&state.db).files(path.report()?).await?;
    Ok(Json(json!({ "files": files })))
}

/// GET .../reports/:reportId/files/:fileId
pub async fn file(State(state): State<AppState>, Path(path): Path<ReportPath>) -> Result<Bare<ReportFile>, ApiError> {
    let file = ReportService::new(&state.db).file(path.report()?, path.file()?).await?;
    Ok(Bare::ok(file))
}
