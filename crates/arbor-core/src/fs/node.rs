//! Node representation.
//!
//! A [`Node`] is either a [`FileNode`] or a [`DirectoryNode`]. Nodes never
//! point at each other directly: parent and child relationships are
//! [`NodeId`]s resolved through the owning project's node map.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, stable identifier of a node, unique for the project's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Allocates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Fields shared by both node variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMeta {
    id: NodeId,
    name: String,
    path: String,
    parent_id: Option<NodeId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl NodeMeta {
    pub(crate) fn new(
        name: String,
        path: String,
        parent_id: Option<NodeId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NodeId::generate(),
            name,
            path,
            parent_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A file and its content.
///
/// `content` is text or a base64 data URI (see [`crate::fs::content`]);
/// `size` is always the byte length of the payload it represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    #[serde(flatten)]
    meta: NodeMeta,
    content: String,
    size: u64,
    #[serde(default)]
    binary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
}

impl FileNode {
    pub(crate) fn new(
        meta: NodeMeta,
        content: String,
        binary: bool,
        mime_type: Option<String>,
    ) -> Self {
        let size = crate::fs::content::byte_size(&content, binary);
        Self {
            meta,
            content,
            size,
            binary,
            mime_type,
        }
    }

    pub fn id(&self) -> NodeId {
        self.meta.id
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn path(&self) -> &str {
        &self.meta.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Byte length of the content.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_binary(&self) -> bool {
        self.binary
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Replaces the content. A text file stays text; a binary file stays
    /// binary as long as the new content is still a data URI.
    pub(crate) fn set_content(&mut self, content: String, now: DateTime<Utc>) {
        self.binary = self.binary && crate::fs::content::is_data_uri(&content);
        self.size = crate::fs::content::byte_size(&content, self.binary);
        self.content = content;
        self.meta.updated_at = now;
    }
}

/// A directory and the ids of its children.
///
/// Child order is insertion order and carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryNode {
    #[serde(flatten)]
    meta: NodeMeta,
    children: Vec<NodeId>,
}

impl DirectoryNode {
    pub(crate) fn new(meta: NodeMeta) -> Self {
        Self {
            meta,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.meta.id
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn path(&self) -> &str {
        &self.meta.path
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub(crate) fn push_child(&mut self, id: NodeId) {
        self.children.push(id);
    }

    pub(crate) fn remove_child(&mut self, id: NodeId) {
        self.children.retain(|c| *c != id);
    }
}

/// A file or directory entry in the virtual filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    File(FileNode),
    Directory(DirectoryNode),
}

impl Node {
    fn meta(&self) -> &NodeMeta {
        match self {
            Node::File(f) => &f.meta,
            Node::Directory(d) => &d.meta,
        }
    }

    fn meta_mut(&mut self) -> &mut NodeMeta {
        match self {
            Node::File(f) => &mut f.meta,
            Node::Directory(d) => &mut d.meta,
        }
    }

    pub fn id(&self) -> NodeId {
        self.meta().id
    }

    /// Returns the single path segment naming this node.
    pub fn name(&self) -> &str {
        &self.meta().name
    }

    /// Returns the full normalized path, derived from the parent chain.
    pub fn path(&self) -> &str {
        &self.meta().path
    }

    /// Returns the owning directory's id; `None` only for the root.
    pub fn parent_id(&self) -> Option<NodeId> {
        self.meta().parent_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.meta().created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.meta().updated_at
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Node::File(_))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            Node::File(f) => Some(f),
            Node::Directory(_) => None,
        }
    }

    pub fn as_dir(&self) -> Option<&DirectoryNode> {
        match self {
            Node::Directory(d) => Some(d),
            Node::File(_) => None,
        }
    }

    pub(crate) fn as_file_mut(&mut self) -> Option<&mut FileNode> {
        match self {
            Node::File(f) => Some(f),
            Node::Directory(_) => None,
        }
    }

    pub(crate) fn as_dir_mut(&mut self) -> Option<&mut DirectoryNode> {
        match self {
            Node::Directory(d) => Some(d),
            Node::File(_) => None,
        }
    }

    /// Children of a directory; empty for files.
    pub fn children(&self) -> &[NodeId] {
        match self {
            Node::Directory(d) => d.children(),
            Node::File(_) => &[],
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.meta_mut().name = name;
    }

    pub(crate) fn set_path(&mut self, path: String) {
        self.meta_mut().path = path;
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.meta_mut().parent_id = parent;
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.meta_mut().updated_at = now;
    }
}

impl From<FileNode> for Node {
    fn from(file: FileNode) -> Self {
        Node::File(file)
    }
}

impl From<DirectoryNode> for Node {
    fn from(dir: DirectoryNode) -> Self {
        Node::Directory(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, content: &str) -> Node {
        let meta = NodeMeta::new(name.to_string(), format!("/{name}"), None, Utc::now());
        FileNode::new(meta, content.to_string(), false, None).into()
    }

    #[test]
    fn node_ids_are_unique() {
        assert_ne!(NodeId::generate(), NodeId::generate());
    }

    #[test]
    fn file_size_tracks_content() {
        let mut node = file("a.txt", "hello");
        assert_eq!(node.as_file().unwrap().size(), 5);

        let later = Utc::now();
        node.as_file_mut()
            .unwrap()
            .set_content("hi".to_string(), later);
        let f = node.as_file().unwrap();
        assert_eq!(f.size(), 2);
        assert_eq!(f.content(), "hi");
        assert_eq!(node.updated_at(), later);
    }

    #[test]
    fn set_content_keeps_text_flag() {
        let mut node = file("a.txt", "");
        node.as_file_mut()
            .unwrap()
            .set_content("data:application/octet-stream;base64,AAE=".to_string(), Utc::now());
        let f = node.as_file().unwrap();
        assert!(!f.is_binary());
        assert_eq!(f.size(), 41);
    }

    #[test]
    fn set_content_on_binary_file() {
        let meta = NodeMeta::new("a.bin".to_string(), "/a.bin".to_string(), None, Utc::now());
        let mut f = FileNode::new(meta, "data:application/octet-stream;base64,AA==".to_string(), true, None);
        assert_eq!(f.size(), 1);

        f.set_content("data:application/octet-stream;base64,AAE=".to_string(), Utc::now());
        assert!(f.is_binary());
        assert_eq!(f.size(), 2);

        f.set_content("now text".to_string(), Utc::now());
        assert!(!f.is_binary());
        assert_eq!(f.size(), 8);
    }

    #[test]
    fn directory_children_add_and_remove() {
        let meta = NodeMeta::new("src".to_string(), "/src".to_string(), None, Utc::now());
        let mut dir = DirectoryNode::new(meta);
        let a = NodeId::generate();
        let b = NodeId::generate();
        dir.push_child(a);
        dir.push_child(b);
        dir.remove_child(a);
        assert_eq!(dir.children(), &[b]);
    }

    #[test]
    fn kind_accessors() {
        let f = file("a.txt", "");
        assert!(f.is_file());
        assert!(!f.is_dir());
        assert!(f.as_dir().is_none());
        assert!(f.children().is_empty());
    }

    #[test]
    fn serializes_with_type_tag_and_camel_case() {
        let node = file("a.txt", "x");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["name"], "a.txt");
        assert!(json.get("parentId").is_some());
        assert!(json["createdAt"].as_str().unwrap().contains('T'));

        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }
}
