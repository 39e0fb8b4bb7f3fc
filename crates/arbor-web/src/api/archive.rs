use arbor_core::{archive, ArchiveEntry, ProjectId};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::dto::{ArchiveEntryDto, ExportResponse, ImportRequest, ImportResponse, ProjectSummary};
use crate::error::AppError;
use crate::state::AppState;

/// Creates and opens a project from base64-encoded archive entries.
pub async fn import(
    State(state): State<AppState>,
    Json(req): Json<ImportRequest>,
) -> Result<(StatusCode, Json<ImportResponse>), AppError> {
    let entries = req
        .entries
        .into_iter()
        .map(|entry| {
            let data = STANDARD
                .decode(entry.data.as_bytes())
                .map_err(|e| AppError::BadRequest(format!("Invalid base64 in {}: {e}", entry.path)))?;
            Ok::<_, AppError>(ArchiveEntry::file(entry.path, data))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (project, report) = archive::import(&req.name, entries, &state.config.core.import)?;
    let summary = ProjectSummary::of(&project, true);
    state.open(project);

    tracing::info!(
        id = %summary.id,
        files = report.files,
        skipped = report.skipped.len(),
        "imported project"
    );
    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            project: summary,
            report,
        }),
    ))
}

pub async fn export(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<ExportResponse>, AppError> {
    let handle = state.workspace(id)?;
    let ws = handle.lock().await;
    let entries = archive::export(&ws.project)?
        .into_iter()
        .map(|entry| ArchiveEntryDto {
            path: entry.path,
            data: STANDARD.encode(&entry.data),
        })
        .collect();

    Ok(Json(ExportResponse {
        name: ws.project.name().to_string(),
        entries,
    }))
}
