//! Structural diffing of node-map snapshots.
//!
//! Two snapshots are compared by node id, never by path: a node that kept
//! its id but changed its path was moved (or renamed), not deleted and
//! re-created.

use serde::{Deserialize, Serialize};

use crate::fs::node::{Node, NodeId};
use crate::fs::project::NodeMap;

/// A structural delta between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Change {
    /// The id exists only in the newer snapshot.
    Create { id: NodeId, path: String },
    /// A file kept its path but its content differs.
    Update { id: NodeId, path: String },
    /// The id exists only in the older snapshot.
    Delete { id: NodeId, path: String },
    /// The id's path differs between snapshots.
    ///
    /// A content change on a moved file is not reported separately.
    Move {
        id: NodeId,
        old_path: String,
        new_path: String,
        old_parent_id: Option<NodeId>,
        new_parent_id: Option<NodeId>,
    },
}

impl Change {
    pub fn id(&self) -> NodeId {
        match self {
            Change::Create { id, .. }
            | Change::Update { id, .. }
            | Change::Delete { id, .. }
            | Change::Move { id, .. } => *id,
        }
    }

    /// The path the change concerns; the destination for moves.
    pub fn path(&self) -> &str {
        match self {
            Change::Create { path, .. } | Change::Update { path, .. } | Change::Delete { path, .. } => {
                path
            }
            Change::Move { new_path, .. } => new_path,
        }
    }
}

fn content_differs(before: &Node, after: &Node) -> bool {
    match (before.as_file(), after.as_file()) {
        (Some(b), Some(a)) => b.content() != a.content(),
        _ => false,
    }
}

/// Compares two node maps by id.
///
/// Output order is unspecified beyond creates and moves/updates being
/// listed before deletes.
pub fn diff(before: &NodeMap, after: &NodeMap) -> Vec<Change> {
    let mut changes = Vec::new();

    for (id, new) in after {
        let Some(old) = before.get(id) else {
            changes.push(Change::Create {
                id: *id,
                path: new.path().to_string(),
            });
            continue;
        };
        if old.path() != new.path() {
            changes.push(Change::Move {
                id: *id,
                old_path: old.path().to_string(),
                new_path: new.path().to_string(),
                old_parent_id: old.parent_id(),
                new_parent_id: new.parent_id(),
            });
        } else if content_differs(old, new) {
            changes.push(Change::Update {
                id: *id,
                path: new.path().to_string(),
            });
        }
    }

    for (id, old) in before {
        if !after.contains_key(id) {
            changes.push(Change::Delete {
                id: *id,
                path: old.path().to_string(),
            });
        }
    }

    changes
}
