use arbor_core::fs::path;
use arbor_core::{apply_plan, EditCommand, Engine, FileNode, PlanOptions, ProjectId};
use axum::extract::{Path, Query, State};
use axum::Json;

use crate::dto::{CommandResponse, NodeDto, PathQuery, PlanRequest, PlanResponse, TreeResponse};
use crate::error::AppError;
use crate::state::AppState;

pub async fn tree(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Query(query): Query<PathQuery>,
) -> Result<Json<TreeResponse>, AppError> {
    let handle = state.workspace(id)?;
    let mut ws = handle.lock().await;
    let engine = Engine::new(&mut ws.project);

    let current_path = path::normalize(query.path.as_deref().unwrap_or(path::ROOT));
    let entries = engine
        .list_directory(&current_path)?
        .into_iter()
        .map(NodeDto::from)
        .collect();

    Ok(Json(TreeResponse {
        entries,
        current_path,
    }))
}

pub async fn file(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Query(query): Query<PathQuery>,
) -> Result<Json<FileNode>, AppError> {
    let Some(file_path) = query.path else {
        return Err(AppError::BadRequest("Missing path".to_string()));
    };
    let handle = state.workspace(id)?;
    let mut ws = handle.lock().await;
    let engine = Engine::new(&mut ws.project);
    Ok(Json(engine.read_file(&file_path)?.clone()))
}

/// Applies one edit as its own history entry.
pub async fn command(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Json(command): Json<EditCommand>,
) -> Result<Json<CommandResponse>, AppError> {
    let handle = state.workspace(id)?;
    let mut guard = handle.lock().await;
    let ws = &mut *guard;

    let description = command.describe();
    let node = ws
        .history
        .record(&mut ws.project, description, |engine| engine.execute(command))?;

    Ok(Json(CommandResponse {
        node,
        history: (&ws.history).into(),
    }))
}

/// Applies a change plan as a single history entry. Item failures are
/// reported in the body, never as an error status.
pub async fn plan(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Json(req): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, AppError> {
    let handle = state.workspace(id)?;
    let mut guard = handle.lock().await;
    let ws = &mut *guard;

    let options = PlanOptions::from_config(&state.config.core.plan);
    let description = req
        .description
        .unwrap_or_else(|| format!("Apply plan ({} changes)", req.intents.len()));
    let report = ws.history.record(&mut ws.project, description, |engine| {
        Ok(apply_plan(engine, &req.intents, &options))
    })?;

    Ok(Json(PlanResponse::new(report, &ws.history)))
}
