//! Arbor core library: the in-memory project model behind the editor.
//!
//! `arbor-core` owns the virtual filesystem a browser-hosted code editor
//! works on. It has no I/O of its own beyond configuration loading, so the
//! web host (`arbor-web`) and any future frontend can share the same logic.
//!
//! # Modules
//!
//! - [`fs`]: path algebra, the node model, the CRUD [`Engine`] and snapshot diffing.
//! - [`edit`]: serializable edit commands, undo/redo [`History`] and change-plan application.
//! - [`io`]: project (de)serialization and archive import/export.
//! - [`config`]: TOML-based core settings.
//! - [`error`]: unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod config;
pub mod edit;
pub mod error;
pub mod fs;
pub mod io;

pub use config::Config;
pub use edit::{
    apply_plan, ChangeIntent, CreatePolicy, EditCommand, History, HistoryEntry, IntentKind,
    PathPolicy, PlanOptions, PlanReport,
};
pub use error::{CoreError, CoreResult, ErrorKind, NameError};
pub use fs::{
    diff, Change, DirectoryNode, Engine, FileNode, FileOptions, Node, NodeId, NodeMap, Project,
    ProjectId,
};
pub use io::archive::{self, ArchiveEntry};
pub use io::persist;
