//! Error types for `arbor-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`. Variants are granular so
//! callers can report precisely what went wrong; [`CoreError::kind`]
//! collapses them into the coarse [`ErrorKind`] taxonomy used by hosts.

use std::path::PathBuf;

/// Reasons a single path segment is rejected as a node name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("name is empty")]
    Empty,
    #[error("name contains a path separator")]
    ContainsSeparator,
    #[error("name contains a control character")]
    InvalidCharacter,
    #[error("name is reserved")]
    ReservedName,
    #[error("name is too long")]
    TooLong,
}

/// Unified error type for all core operations.
///
/// Each variant captures just enough context for the caller to display
/// a meaningful message or take corrective action.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A node name failed validation.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: NameError },

    /// The parent path of a create call does not resolve.
    #[error("parent not found: {0}")]
    ParentNotFound(String),

    /// The parent path of a create call resolves to a file.
    #[error("parent is not a directory: {0}")]
    ParentNotDirectory(String),

    /// A sibling with the requested name already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The path does not resolve to any node.
    #[error("path not found: {0}")]
    NotFound(String),

    /// A file was expected but the path points to a directory.
    #[error("not a file: {0}")]
    NotAFile(String),

    /// A directory was expected but the path points to a file.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// The root directory cannot be renamed, moved or deleted.
    #[error("the root directory cannot be modified")]
    RootImmutable,

    /// The destination directory of a move does not resolve.
    #[error("move target not found: {0}")]
    TargetNotFound(String),

    /// The destination of a move resolves to a file.
    #[error("move target is not a directory: {0}")]
    TargetNotDirectory(String),

    /// A directory would become its own descendant.
    #[error("cannot move {source_path} into its own subtree {target}")]
    CyclicMove { source_path: String, target: String },

    /// A change-plan path was rejected by the caller's allow-list.
    #[error("path not allowed: {0}")]
    PathNotAllowed(String),

    /// A history jump addressed an entry that does not exist.
    #[error("history index {index} out of range (len {len})")]
    HistoryIndexOutOfRange { index: isize, len: usize },

    /// Loaded project data violates a tree invariant.
    #[error("corrupt project: {0}")]
    Corrupt(String),

    /// Project (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File content could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Failed to parse a TOML configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// The process lacks permission to access the path.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`CoreError`] for callers that only need to
/// decide how loudly to fail (HTTP status codes, UI toasts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidPath,
    InvalidOperation,
    CyclicMove,
    Internal,
}

impl CoreError {
    pub(crate) fn invalid_name(name: &str, reason: NameError) -> Self {
        Self::InvalidName {
            name: name.to_string(),
            reason,
        }
    }

    /// Returns the taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::ParentNotFound(_) | Self::TargetNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::InvalidName { .. } | Self::PathNotAllowed(_) => ErrorKind::InvalidPath,
            Self::ParentNotDirectory(_)
            | Self::NotAFile(_)
            | Self::NotADirectory(_)
            | Self::RootImmutable
            | Self::TargetNotDirectory(_)
            | Self::HistoryIndexOutOfRange { .. } => ErrorKind::InvalidOperation,
            Self::CyclicMove { .. } => ErrorKind::CyclicMove,
            Self::Corrupt(_)
            | Self::Serialization(_)
            | Self::Encoding(_)
            | Self::ConfigParse(_)
            | Self::PermissionDenied(_)
            | Self::Io(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience alias used throughout `arbor-core`.
pub type CoreResult<T> = Result<T, CoreError>;
