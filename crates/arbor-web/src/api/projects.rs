use std::collections::HashSet;
use std::sync::Arc;

use arbor_core::{Project, ProjectId};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::dto::{CreateProjectRequest, ProjectSummary, RenameProjectRequest};
use crate::error::AppError;
use crate::state::AppState;
use crate::storage;

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectSummary>), AppError> {
    let name = project_name(&req.name)?;
    let project = Project::new(name);
    let summary = ProjectSummary::of(&project, true);
    state.open(project);
    tracing::info!(id = %summary.id, name = %summary.name, "created project");
    Ok((StatusCode::CREATED, Json(summary)))
}

fn project_name(raw: &str) -> Result<&str, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Project name is empty".to_string()));
    }
    Ok(name)
}

/// Open projects plus those only stored on disk, most recently updated first.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProjectSummary>>, AppError> {
    let handles: Vec<_> = state
        .workspaces
        .iter()
        .map(|entry| (*entry.key(), Arc::clone(entry.value())))
        .collect();

    let mut seen = HashSet::new();
    let mut summaries = Vec::new();
    for (id, handle) in handles {
        let ws = handle.lock().await;
        summaries.push(ProjectSummary::of(&ws.project, true));
        seen.insert(id);
    }
    for project in storage::stored(&state.config).await? {
        if !seen.contains(&project.id()) {
            summaries.push(ProjectSummary::of(&project, false));
        }
    }

    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(Json(summaries))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<ProjectSummary>, AppError> {
    if let Ok(handle) = state.workspace(id) {
        let ws = handle.lock().await;
        return Ok(Json(ProjectSummary::of(&ws.project, true)));
    }
    let project = storage::load(&state.config, id).await?;
    Ok(Json(ProjectSummary::of(&project, false)))
}

/// Renames an open project. Node paths are unaffected.
pub async fn rename(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Json(req): Json<RenameProjectRequest>,
) -> Result<Json<ProjectSummary>, AppError> {
    let name = project_name(&req.name)?;
    let handle = state.workspace(id)?;
    let mut ws = handle.lock().await;
    ws.project.set_name(name);
    tracing::info!(id = %id, name = %name, "renamed project");
    Ok(Json(ProjectSummary::of(&ws.project, true)))
}

/// Closes the project and deletes its stored document.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<StatusCode, AppError> {
    let was_open = state.workspaces.remove(&id).is_some();
    let was_stored = storage::remove(&state.config, id).await?;
    if !was_open && !was_stored {
        return Err(AppError::NotFound(format!("Project not found: {id}")));
    }
    tracing::info!(id = %id, "deleted project");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn save(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<ProjectSummary>, AppError> {
    let handle = state.workspace(id)?;
    let ws = handle.lock().await;
    storage::save(&state.config, &ws.project).await?;
    Ok(Json(ProjectSummary::of(&ws.project, true)))
}

/// Loads a stored project into memory with an empty history. Opening an
/// already open project only bumps its `last_opened_at`.
pub async fn open(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<ProjectSummary>, AppError> {
    if let Ok(handle) = state.workspace(id) {
        let mut ws = handle.lock().await;
        ws.project.touch_opened();
        return Ok(Json(ProjectSummary::of(&ws.project, true)));
    }

    let mut project = storage::load(&state.config, id).await?;
    project.touch_opened();
    let summary = ProjectSummary::of(&project, true);
    state.open(project);
    tracing::info!(id = %id, "opened project");
    Ok(Json(summary))
}
