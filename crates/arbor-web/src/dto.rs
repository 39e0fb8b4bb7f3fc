use arbor_core::edit::plan::{AppliedIntent, PlanReport};
use arbor_core::io::archive::ImportReport;
use arbor_core::{Change, ChangeIntent, ErrorKind, History, Node, NodeId, Project, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameProjectRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
    pub node_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_opened_at: DateTime<Utc>,
    /// Loaded in memory, as opposed to only stored on disk.
    pub open: bool,
}

impl ProjectSummary {
    pub fn of(project: &Project, open: bool) -> Self {
        Self {
            id: project.id(),
            name: project.name().to_string(),
            node_count: project.len(),
            created_at: project.created_at(),
            updated_at: project.updated_at(),
            last_opened_at: project.last_opened_at(),
            open,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeDto {
    pub id: NodeId,
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub size: Option<u64>,
    pub mime_type: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Node> for NodeDto {
    fn from(node: &Node) -> Self {
        let file = node.as_file();
        Self {
            id: node.id(),
            name: node.name().to_string(),
            path: node.path().to_string(),
            is_dir: node.is_dir(),
            size: file.map(|f| f.size()),
            mime_type: file.and_then(|f| f.mime_type()).map(str::to_string),
            updated_at: node.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TreeResponse {
    pub entries: Vec<NodeDto>,
    pub current_path: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryState {
    pub current_index: isize,
    pub can_undo: bool,
    pub can_redo: bool,
    pub len: usize,
}

impl From<&History> for HistoryState {
    fn from(history: &History) -> Self {
        Self {
            current_index: history.current_index(),
            can_undo: history.can_undo(),
            can_redo: history.can_redo(),
            len: history.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryEntryDto {
    pub index: usize,
    pub description: String,
    pub recorded_at: DateTime<Utc>,
    pub changes: Vec<Change>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    #[serde(flatten)]
    pub state: HistoryState,
    pub entries: Vec<HistoryEntryDto>,
}

impl From<&History> for HistoryResponse {
    fn from(history: &History) -> Self {
        let entries = history
            .entries()
            .enumerate()
            .map(|(index, entry)| HistoryEntryDto {
                index,
                description: entry.description().to_string(),
                recorded_at: entry.recorded_at(),
                changes: entry.changes().to_vec(),
            })
            .collect();
        Self {
            state: history.into(),
            entries,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub node: Option<Node>,
    pub history: HistoryState,
}

#[derive(Debug, Serialize)]
pub struct StepResponse {
    /// Whether the step moved the history cursor.
    pub applied: bool,
    pub history: HistoryState,
}

#[derive(Debug, Deserialize)]
pub struct JumpRequest {
    pub index: isize,
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub description: Option<String>,
    pub intents: Vec<ChangeIntent>,
}

#[derive(Debug, Serialize)]
pub struct PlanErrorDto {
    pub index: usize,
    pub path: String,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub changed: bool,
    pub applied: Vec<AppliedIntent>,
    pub errors: Vec<PlanErrorDto>,
    pub history: HistoryState,
}

impl PlanResponse {
    pub fn new(report: PlanReport, history: &History) -> Self {
        let errors = report
            .errors
            .into_iter()
            .map(|item| PlanErrorDto {
                index: item.index,
                path: item.path,
                kind: item.error.kind(),
                message: item.error.to_string(),
            })
            .collect();
        Self {
            changed: report.changed,
            applied: report.applied,
            errors,
            history: history.into(),
        }
    }
}

/// An archive member with base64-encoded data.
#[derive(Debug, Serialize, Deserialize)]
pub struct ArchiveEntryDto {
    pub path: String,
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub name: String,
    pub entries: Vec<ArchiveEntryDto>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub project: ProjectSummary,
    pub report: ImportReport,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub name: String,
    pub entries: Vec<ArchiveEntryDto>,
}
