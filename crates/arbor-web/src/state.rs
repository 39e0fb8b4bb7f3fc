use std::sync::Arc;

use arbor_core::{History, Project, ProjectId};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::error::AppError;

/// An open project together with its undo history.
pub struct Workspace {
    pub project: Project,
    pub history: History,
}

/// Open workspaces. Each sits behind its own mutex so edits to one project
/// are applied strictly one at a time.
pub type Registry = DashMap<ProjectId, Arc<Mutex<Workspace>>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub workspaces: Arc<Registry>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            workspaces: Arc::new(DashMap::new()),
        }
    }

    /// Registers `project` with a fresh history and returns its id.
    pub fn open(&self, project: Project) -> ProjectId {
        let id = project.id();
        let history = History::from_config(&self.config.core.history);
        self.workspaces
            .insert(id, Arc::new(Mutex::new(Workspace { project, history })));
        id
    }

    /// Looks up an open workspace. The returned handle is cloned out of the
    /// map so no shard lock is held while awaiting the mutex.
    pub fn workspace(&self, id: ProjectId) -> Result<Arc<Mutex<Workspace>>, AppError> {
        self.workspaces
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AppError::NotFound(format!("Project not open: {id}")))
    }
}
