//! Adapters between projects and the outside world.
//!
//! [`persist`] turns a project into bytes for storage and back;
//! [`archive`] maps projects to and from flat archive entry lists.

pub mod archive;
pub mod persist;

pub use archive::{ArchiveEntry, ImportReport, SkippedEntry};
