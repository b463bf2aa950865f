// handlers/protected/reports.rs - report and attachment mutations (pilot or commander)

use axum::{
    extract::{Multipart, Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};

use crate::auth::Principal;
use crate::database::models::{Report, ReportInput};
use crate::error::ApiError;
use crate::handlers::{parse_id, IncidentPath, ReportPath};
use crate::middleware::{message, ApiJson, Bare};
use crate::services::reports::Upload;
use crate::services::ReportService;
use crate::state::AppState;

/// POST /api/missions/:missionId/incidents/:incidentId/reports
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(path): Path<IncidentPath>,
    ApiJson(input): ApiJson<ReportInput>,
) -> Result<Bare<Report>, ApiError> {
    let mission_id = parse_id(&path.mission_id)?;
    let incident_id = parse_id(&path.incident_id)?;
    let report = ReportService::new(&state.db)
        .create(&principal, mission_id, incident_id, input)
        .await?;
    Ok(Bare::created(report))
}

/// PUT .../reports/:reportId
pub async fn update(
    State(state): State<AppState>,
    Path(path): Path<ReportPath>,
    ApiJson(input): ApiJson<ReportInput>,
) -> Result<Bare<Report>, ApiError> {
    let report = ReportService::new(&state.db).update(path.report()?, input).await?;
    Ok(Bare::ok(report))
}

/// DELETE .../reports/:reportId
pub async fn delete(State(state): State<AppState>, Path(path): Path<ReportPath>) -> Result<Json<Value>, ApiError> {
    ReportService::new(&state.db).delete(path.report()?).await?;
    Ok(message("Report deleted successfully"))
}

/// POST .../reports/:reportId/upload - multipart, the first file field is stored
pub async fn upload(
    State(state): State<AppState>,
    Path(path): Path<ReportPath>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let report_id = path.report()?;
    let upload = first_file(multipart).await?;
    let file = ReportService::new(&state.db)
        .upload_file(state.storage.as_ref(), report_id, upload)
        .await?;

    Ok(Json(json!({
        "message": "File uploaded and added to report successfully",
        "file_url": file.file_url,
        "file": file,
    })))
}

/// DELETE .../reports/:reportId/files/:fileId - blob first, then the embedded record
pub async fn delete_file(
    State(state): State<AppState>,
    Path(path): Path<ReportPath>,
) -> Result<Json<Value>, ApiError> {
    ReportService::new(&state.db)
        .delete_file(state.storage.as_ref(), path.report()?, path.file()?)
        .await?;
    Ok(message("File deleted successfully"))
}

async fn first_file(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        return Ok(Upload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiError::bad_request("Please upload a file"))
}
