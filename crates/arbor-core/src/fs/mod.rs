//! Virtual filesystem for Arbor projects.
//!
//! This module provides the path algebra ([`path`]), the node model
//! ([`node::Node`], [`project::Project`]), the self-describing content
//! encoding ([`content`]), the CRUD engine ([`ops::Engine`]) and snapshot
//! diffing ([`diff::diff`]).

pub mod content;
pub mod diff;
pub mod node;
pub mod ops;
pub mod path;
pub mod project;

pub use diff::{diff, Change};
pub use node::{DirectoryNode, FileNode, Node, NodeId};
pub use ops::{Engine, FileOptions};
pub use project::{NodeMap, Project, ProjectId};
