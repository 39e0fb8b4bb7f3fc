//! The project aggregate: an id-indexed node table plus the root reference.
//!
//! The [`NodeMap`] is the only place nodes live. Everything else refers to
//! nodes by [`NodeId`] or resolves them by path against the current map.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::fs::content;
use crate::fs::node::{DirectoryNode, Node, NodeId, NodeMeta};
use crate::fs::path::{self, ROOT};

/// Id-indexed node storage. Iteration order is by id, which keeps
/// serialization deterministic.
pub type NodeMap = BTreeMap<NodeId, Node>;

/// Identifier of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Uuid);

impl ProjectId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses the hyphenated string form produced by `Display`.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The full in-memory tree for one editable workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    id: ProjectId,
    name: String,
    root_id: NodeId,
    #[serde(with = "node_entries")]
    nodes: NodeMap,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_opened_at: DateTime<Utc>,
}

impl Project {
    /// Creates a project containing only an empty root directory.
    ///
    /// The root's name is empty and its path is the separator alone.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        let root = DirectoryNode::new(NodeMeta::new(String::new(), ROOT.to_string(), None, now));
        let root: Node = root.into();
        let root_id = root.id();
        let mut nodes = NodeMap::new();
        nodes.insert(root_id, root);
        Self {
            id: ProjectId::generate(),
            name: name.into(),
            root_id,
            nodes,
            created_at: now,
            updated_at: now,
            last_opened_at: now,
        }
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    /// Returns the root directory node.
    pub fn root(&self) -> &Node {
        &self.nodes[&self.root_id]
    }

    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.root().children().is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn last_opened_at(&self) -> DateTime<Utc> {
        self.last_opened_at
    }

    /// Marks the project as opened now.
    pub fn touch_opened(&mut self) {
        self.last_opened_at = self.now();
    }

    /// A timestamp that never precedes `updated_at`, so node and project
    /// timestamps stay monotonic even if the wall clock steps backwards.
    pub(crate) fn now(&self) -> DateTime<Utc> {
        Utc::now().max(self.updated_at)
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = self.now();
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut NodeMap {
        &mut self.nodes
    }

    /// Swaps in a whole node map at once and returns the previous one.
    ///
    /// The map must describe a tree rooted at this project's root id; history
    /// snapshots are the only caller.
    pub(crate) fn replace_nodes(&mut self, nodes: NodeMap) -> NodeMap {
        let previous = std::mem::replace(&mut self.nodes, nodes);
        self.touch();
        previous
    }

    /// Checks every structural invariant of the tree.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Corrupt`] describing the first violation found.
    pub fn verify(&self) -> CoreResult<()> {
        let corrupt = |msg: String| Err(CoreError::Corrupt(msg));

        let root = match self.nodes.get(&self.root_id) {
            Some(root) => root,
            None => return corrupt(format!("root {} missing from node map", self.root_id)),
        };
        if !root.is_dir() || root.parent_id().is_some() || root.path() != ROOT {
            return corrupt("root must be a parentless directory at /".to_string());
        }

        for (id, node) in &self.nodes {
            if *id != node.id() {
                return corrupt(format!("node {} stored under key {id}", node.id()));
            }
            if let Some(file) = node.as_file() {
                if file.size() != content::byte_size(file.content(), file.is_binary()) {
                    return corrupt(format!("{}: size does not match content", node.path()));
                }
            }

            let parent_id = match node.parent_id() {
                Some(p) => p,
                None if *id == self.root_id => continue,
                None => return corrupt(format!("{}: second parentless node", node.path())),
            };
            let parent = match self.nodes.get(&parent_id) {
                Some(p) => p,
                None => return corrupt(format!("{}: parent {parent_id} missing", node.path())),
            };
            let Some(dir) = parent.as_dir() else {
                return corrupt(format!("{}: parent is a file", node.path()));
            };
            if dir.children().iter().filter(|c| **c == *id).count() != 1 {
                return corrupt(format!(
                    "{}: not listed exactly once by its parent",
                    node.path()
                ));
            }
            if let Err(reason) = path::validate_name(node.name()) {
                return corrupt(format!("{}: {reason}", node.path()));
            }
            if node.path() != path::child(parent.path(), node.name()) {
                return corrupt(format!(
                    "{}: path does not match parent {}",
                    node.path(),
                    parent.path()
                ));
            }
        }

        for node in self.nodes.values() {
            let mut names = HashSet::new();
            for child_id in node.children() {
                let Some(child) = self.nodes.get(child_id) else {
                    return corrupt(format!("{}: lists missing child {child_id}", node.path()));
                };
                if child.parent_id() != Some(node.id()) {
                    return corrupt(format!("{}: lists foreign child", node.path()));
                }
                if !names.insert(child.name()) {
                    return corrupt(format!("{}: duplicate name {}", node.path(), child.name()));
                }
            }
        }

        // Every node must reach the root; a parent chain longer than the map is a cycle.
        for node in self.nodes.values() {
            let mut current = node.parent_id();
            let mut steps = 0;
            while let Some(id) = current {
                steps += 1;
                if steps > self.nodes.len() {
                    return corrupt(format!("{}: parent chain is cyclic", node.path()));
                }
                current = self.nodes.get(&id).and_then(Node::parent_id);
            }
        }

        Ok(())
    }
}

/// Serializes the node map as an ordered list of `[id, node]` pairs.
mod node_entries {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::NodeMap;
    use crate::fs::node::{Node, NodeId};

    pub fn serialize<S: Serializer>(nodes: &NodeMap, serializer: S) -> Result<S::Ok, S::Error> {
        let entries: Vec<(&NodeId, &Node)> = nodes.iter().collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NodeMap, D::Error> {
        let entries = Vec::<(NodeId, Node)>::deserialize(deserializer)?;
        let expected = entries.len();
        let nodes: NodeMap = entries.into_iter().collect();
        if nodes.len() != expected {
            return Err(D::Error::custom("duplicate node id in node list"));
        }
        Ok(nodes)
    }
}
