use arbor_core::ProjectId;
use axum::extract::{Path, State};
use axum::Json;

use crate::dto::{HistoryResponse, HistoryState, JumpRequest, StepResponse};
use crate::error::AppError;
use crate::state::AppState;

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<HistoryResponse>, AppError> {
    let handle = state.workspace(id)?;
    let ws = handle.lock().await;
    Ok(Json((&ws.history).into()))
}

pub async fn undo(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<StepResponse>, AppError> {
    let handle = state.workspace(id)?;
    let mut guard = handle.lock().await;
    let ws = &mut *guard;
    let applied = ws.history.undo(&mut ws.project);
    Ok(Json(StepResponse {
        applied,
        history: (&ws.history).into(),
    }))
}

pub async fn redo(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<StepResponse>, AppError> {
    let handle = state.workspace(id)?;
    let mut guard = handle.lock().await;
    let ws = &mut *guard;
    let applied = ws.history.redo(&mut ws.project);
    Ok(Json(StepResponse {
        applied,
        history: (&ws.history).into(),
    }))
}

pub async fn jump(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Json(req): Json<JumpRequest>,
) -> Result<Json<HistoryState>, AppError> {
    let handle = state.workspace(id)?;
    let mut guard = handle.lock().await;
    let ws = &mut *guard;
    ws.history.jump_to(&mut ws.project, req.index)?;
    Ok(Json((&ws.history).into()))
}
