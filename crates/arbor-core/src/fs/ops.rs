//! Filesystem operation engine.
//!
//! [`Engine`] borrows one [`Project`] mutably and performs every CRUD
//! operation against it. Each public call validates completely before it
//! touches the node map, so a returned error always leaves the project
//! exactly as it was.

use tracing::debug;

use crate::edit::command::EditCommand;
use crate::error::{CoreError, CoreResult};
use crate::fs::content;
use crate::fs::node::{DirectoryNode, FileNode, Node, NodeId, NodeMeta};
use crate::fs::path;
use crate::fs::project::{NodeMap, Project};

/// Optional attributes for [`Engine::create_file`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOptions {
    /// Marks the content as binary. Inferred from a data-URI prefix when `None`.
    pub binary: Option<bool>,
    /// Explicit MIME type. Guessed from the extension when `None`.
    pub mime_type: Option<String>,
}

/// CRUD engine bound to a single project.
///
/// # Examples
///
/// ```
/// use arbor_core::{Engine, FileOptions, Project};
///
/// let mut project = Project::new("demo");
/// let mut engine = Engine::new(&mut project);
/// engine.create_directory("/", "src").unwrap();
/// engine
///     .create_file("/src", "main.rs", "fn main() {}", FileOptions::default())
///     .unwrap();
/// assert!(engine.resolve("/src/main.rs").is_some());
/// ```
pub struct Engine<'a> {
    project: &'a mut Project,
}

impl<'a> Engine<'a> {
    pub fn new(project: &'a mut Project) -> Self {
        Self { project }
    }

    /// Returns the bound project.
    pub fn project(&self) -> &Project {
        self.project
    }

    pub(crate) fn touch_project(&mut self) {
        self.project.touch();
    }

    /// Looks up a node by path, walking from the root one segment at a time.
    pub fn resolve(&self, path: &str) -> Option<&Node> {
        let id = self.resolve_id(path)?;
        self.project.get(id)
    }

    fn resolve_id(&self, path: &str) -> Option<NodeId> {
        let nodes = self.project.nodes();
        let mut current = self.project.root_id();
        for segment in path::segments(path) {
            let segment = path::nfc_name(segment);
            current = *nodes
                .get(&current)?
                .children()
                .iter()
                .find(|id| nodes.get(*id).is_some_and(|n| n.name() == segment))?;
        }
        Some(current)
    }

    fn sibling_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let nodes = self.project.nodes();
        nodes
            .get(&parent)?
            .children()
            .iter()
            .copied()
            .find(|id| nodes.get(id).is_some_and(|n| n.name() == name))
    }

    /// Validates a create call and returns `(parent id, name, full path)`.
    fn prepare_create(&self, parent_path: &str, name: &str) -> CoreResult<(NodeId, String, String)> {
        let name = path::nfc_name(name);
        path::validate_name(&name).map_err(|reason| CoreError::invalid_name(&name, reason))?;

        let parent_path = path::normalize(parent_path);
        let parent_id = self
            .resolve_id(&parent_path)
            .ok_or_else(|| CoreError::ParentNotFound(parent_path.clone()))?;
        let parent = self
            .project
            .get(parent_id)
            .ok_or_else(|| CoreError::ParentNotFound(parent_path.clone()))?;
        if !parent.is_dir() {
            return Err(CoreError::ParentNotDirectory(parent_path));
        }

        let full_path = path::child(parent.path(), &name);
        if self.sibling_named(parent_id, &name).is_some() {
            return Err(CoreError::AlreadyExists(full_path));
        }
        Ok((parent_id, name, full_path))
    }

    /// Inserts a freshly built node under `parent_id`.
    fn attach_new(&mut self, parent_id: NodeId, node: Node) {
        let now = node.created_at();
        let id = node.id();
        let nodes = self.project.nodes_mut();
        nodes.insert(id, node);
        if let Some(parent) = nodes.get_mut(&parent_id) {
            if let Some(dir) = parent.as_dir_mut() {
                dir.push_child(id);
            }
            parent.touch(now);
        }
        self.project.touch();
    }

    /// Creates a file named `name` inside the directory at `parent_path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidName`] if `name` fails [`path::validate_name`].
    /// - [`CoreError::ParentNotFound`] if `parent_path` does not resolve.
    /// - [`CoreError::ParentNotDirectory`] if it resolves to a file.
    /// - [`CoreError::AlreadyExists`] if a sibling already uses `name`.
    pub fn create_file(
        &mut self,
        parent_path: &str,
        name: &str,
        content: impl Into<String>,
        opts: FileOptions,
    ) -> CoreResult<FileNode> {
        let (parent_id, name, full_path) = self.prepare_create(parent_path, name)?;
        let content = content.into();
        let binary = opts
            .binary
            .unwrap_or_else(|| content::is_data_uri(&content));
        let mime_type = opts
            .mime_type
            .or_else(|| Some(content::guess_mime(&full_path, binary)));

        let now = self.project.now();
        let meta = NodeMeta::new(name, full_path.clone(), Some(parent_id), now);
        let file = FileNode::new(meta, content, binary, mime_type);
        self.attach_new(parent_id, file.clone().into());

        debug!(path = %full_path, size = file.size(), "created file");
        Ok(file)
    }

    /// Creates an empty directory named `name` inside `parent_path`.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::create_file`].
    pub fn create_directory(&mut self, parent_path: &str, name: &str) -> CoreResult<DirectoryNode> {
        let (parent_id, name, full_path) = self.prepare_create(parent_path, name)?;

        let now = self.project.now();
        let meta = NodeMeta::new(name, full_path.clone(), Some(parent_id), now);
        let dir = DirectoryNode::new(meta);
        self.attach_new(parent_id, dir.clone().into());

        debug!(path = %full_path, "created directory");
        Ok(dir)
    }

    /// Creates every missing directory along `dir_path` and returns the
    /// id of the last one.
    ///
    /// All missing names are validated before anything is created, so a
    /// failure leaves the tree untouched.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotADirectory`] if an existing segment is a file.
    /// - [`CoreError::InvalidName`] if a missing segment is not a valid name.
    pub fn ensure_directory(&mut self, dir_path: &str) -> CoreResult<NodeId> {
        let dir_path = path::normalize(dir_path);
        let segments: Vec<String> = path::segments(&dir_path).map(path::nfc_name).collect();

        let mut current = self.project.root_id();
        let mut current_path = path::ROOT.to_string();
        let mut existing = 0;
        for segment in &segments {
            let Some(next) = self.sibling_named(current, segment) else {
                break;
            };
            current_path = path::child(&current_path, segment);
            if !self.project.get(next).is_some_and(Node::is_dir) {
                return Err(CoreError::NotADirectory(current_path));
            }
            current = next;
            existing += 1;
        }

        let missing = &segments[existing..];
        for segment in missing {
            path::validate_name(segment).map_err(|reason| CoreError::invalid_name(segment, reason))?;
        }
        for segment in missing {
            let dir = self.create_directory(&current_path, segment)?;
            current_path = path::child(&current_path, segment);
            current = dir.id();
        }
        Ok(current)
    }

    /// Replaces the content of the file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if `path` does not resolve.
    /// - [`CoreError::NotAFile`] if it resolves to a directory.
    pub fn update_file_content(
        &mut self,
        path: &str,
        content: impl Into<String>,
    ) -> CoreResult<FileNode> {
        let path = path::normalize(path);
        let id = self
            .resolve_id(&path)
            .ok_or_else(|| CoreError::NotFound(path.clone()))?;
        let now = self.project.now();
        let file = self
            .project
            .nodes_mut()
            .get_mut(&id)
            .and_then(Node::as_file_mut)
            .ok_or_else(|| CoreError::NotAFile(path.clone()))?;
        file.set_content(content.into(), now);
        let updated = file.clone();
        self.project.touch();

        debug!(path = %path, size = updated.size(), "updated file");
        Ok(updated)
    }

    /// Renames the node at `path`, rewriting the cached paths of its subtree.
    ///
    /// Renaming a node to its current name is a no-op.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidName`] if `new_name` is invalid.
    /// - [`CoreError::NotFound`] if `path` does not resolve.
    /// - [`CoreError::RootImmutable`] if `path` is the root.
    /// - [`CoreError::AlreadyExists`] if a sibling already uses `new_name`.
    pub fn rename(&mut self, path: &str, new_name: &str) -> CoreResult<Node> {
        let new_name = path::nfc_name(new_name);
        path::validate_name(&new_name)
            .map_err(|reason| CoreError::invalid_name(&new_name, reason))?;

        let path = path::normalize(path);
        let id = self
            .resolve_id(&path)
            .ok_or_else(|| CoreError::NotFound(path.clone()))?;
        let node = self
            .project
            .get(id)
            .ok_or_else(|| CoreError::NotFound(path.clone()))?;
        let Some(parent_id) = node.parent_id() else {
            return Err(CoreError::RootImmutable);
        };
        if node.name() == new_name {
            return Ok(node.clone());
        }
        let old_path = node.path().to_string();
        let new_path = path::child(&path::dirname(&old_path), &new_name);
        if self.sibling_named(parent_id, &new_name).is_some() {
            return Err(CoreError::AlreadyExists(new_path));
        }

        let now = self.project.now();
        let nodes = self.project.nodes_mut();
        if let Some(node) = nodes.get_mut(&id) {
            node.set_name(new_name);
            node.touch(now);
        }
        rewrite_paths(nodes, id, new_path.clone());
        if let Some(parent) = nodes.get_mut(&parent_id) {
            parent.touch(now);
        }
        self.project.touch();

        debug!(from = %old_path, to = %new_path, "renamed node");
        self.cloned(id, &new_path)
    }

    /// Moves the node at `source_path` into the directory at `target_dir_path`.
    ///
    /// Moving a node into the directory that already contains it is a no-op.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if `source_path` does not resolve.
    /// - [`CoreError::RootImmutable`] if `source_path` is the root.
    /// - [`CoreError::TargetNotFound`] if `target_dir_path` does not resolve.
    /// - [`CoreError::TargetNotDirectory`] if the target is a file.
    /// - [`CoreError::CyclicMove`] if the target lies inside the source.
    /// - [`CoreError::AlreadyExists`] if the target has a same-named child.
    pub fn move_node(&mut self, source_path: &str, target_dir_path: &str) -> CoreResult<Node> {
        let source_path = path::normalize(source_path);
        let target_path = path::normalize(target_dir_path);

        let id = self
            .resolve_id(&source_path)
            .ok_or_else(|| CoreError::NotFound(source_path.clone()))?;
        let node = self
            .project
            .get(id)
            .ok_or_else(|| CoreError::NotFound(source_path.clone()))?;
        let Some(old_parent_id) = node.parent_id() else {
            return Err(CoreError::RootImmutable);
        };
        let name = node.name().to_string();
        let source_real_path = node.path().to_string();

        let target_id = self
            .resolve_id(&target_path)
            .ok_or_else(|| CoreError::TargetNotFound(target_path.clone()))?;
        let target = self
            .project
            .get(target_id)
            .ok_or_else(|| CoreError::TargetNotFound(target_path.clone()))?;
        if !target.is_dir() {
            return Err(CoreError::TargetNotDirectory(target_path));
        }
        let target_real_path = target.path().to_string();
        if path::is_sub_path(&source_real_path, &target_real_path)
            || self.has_ancestor(target_id, id)
        {
            return Err(CoreError::CyclicMove {
                source_path: source_real_path,
                target: target_real_path,
            });
        }
        if target_id == old_parent_id {
            return self.cloned(id, &source_real_path);
        }
        let new_path = path::child(&target_real_path, &name);
        if self.sibling_named(target_id, &name).is_some() {
            return Err(CoreError::AlreadyExists(new_path));
        }

        let now = self.project.now();
        let nodes = self.project.nodes_mut();
        if let Some(old_parent) = nodes.get_mut(&old_parent_id) {
            if let Some(dir) = old_parent.as_dir_mut() {
                dir.remove_child(id);
            }
            old_parent.touch(now);
        }
        if let Some(new_parent) = nodes.get_mut(&target_id) {
            if let Some(dir) = new_parent.as_dir_mut() {
                dir.push_child(id);
            }
            new_parent.touch(now);
        }
        if let Some(node) = nodes.get_mut(&id) {
            node.set_parent(Some(target_id));
            node.touch(now);
        }
        rewrite_paths(nodes, id, new_path.clone());
        self.project.touch();

        debug!(from = %source_real_path, to = %new_path, "moved node");
        self.cloned(id, &new_path)
    }

    /// Deletes the node at `path` together with its whole subtree.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if `path` does not resolve.
    /// - [`CoreError::RootImmutable`] if `path` is the root.
    pub fn delete(&mut self, path: &str) -> CoreResult<()> {
        let path = path::normalize(path);
        let id = self
            .resolve_id(&path)
            .ok_or_else(|| CoreError::NotFound(path.clone()))?;
        let Some(parent_id) = self.project.get(id).and_then(Node::parent_id) else {
            return Err(CoreError::RootImmutable);
        };

        let now = self.project.now();
        let nodes = self.project.nodes_mut();
        let doomed = subtree_ids(nodes, id);
        // Reverse pre-order removes every child before its directory.
        for node_id in doomed.iter().rev() {
            nodes.remove(node_id);
        }
        if let Some(parent) = nodes.get_mut(&parent_id) {
            if let Some(dir) = parent.as_dir_mut() {
                dir.remove_child(id);
            }
            parent.touch(now);
        }
        self.project.touch();

        debug!(path = %path, removed = doomed.len(), "deleted node");
        Ok(())
    }

    /// Returns the file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if `path` does not resolve.
    /// - [`CoreError::NotAFile`] if it resolves to a directory.
    pub fn read_file(&self, path: &str) -> CoreResult<&FileNode> {
        let node = self
            .resolve(path)
            .ok_or_else(|| CoreError::NotFound(path::normalize(path)))?;
        node.as_file()
            .ok_or_else(|| CoreError::NotAFile(path::normalize(path)))
    }

    /// Lists the children of the directory at `path`, directories first,
    /// then by name.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if `path` does not resolve.
    /// - [`CoreError::NotADirectory`] if it resolves to a file.
    pub fn list_directory(&self, path: &str) -> CoreResult<Vec<&Node>> {
        let node = self
            .resolve(path)
            .ok_or_else(|| CoreError::NotFound(path::normalize(path)))?;
        if !node.is_dir() {
            return Err(CoreError::NotADirectory(path::normalize(path)));
        }
        let nodes = self.project.nodes();
        let mut children: Vec<&Node> = node
            .children()
            .iter()
            .filter_map(|id| nodes.get(id))
            .collect();
        children.sort_by(|a, b| {
            b.is_dir()
                .cmp(&a.is_dir())
                .then_with(|| a.name().cmp(b.name()))
        });
        Ok(children)
    }

    /// Every file in the project, sorted by path.
    pub fn files(&self) -> Vec<&FileNode> {
        files_of(self.project)
    }

    /// Runs a single [`EditCommand`]. Returns the affected node, or `None`
    /// for deletions.
    pub fn execute(&mut self, command: EditCommand) -> CoreResult<Option<Node>> {
        match command {
            EditCommand::CreateFile {
                parent,
                name,
                content,
                mime_type,
            } => {
                let opts = FileOptions {
                    binary: None,
                    mime_type,
                };
                self.create_file(&parent, &name, content, opts)
                    .map(|f| Some(f.into()))
            }
            EditCommand::CreateDirectory { parent, name } => self
                .create_directory(&parent, &name)
                .map(|d| Some(d.into())),
            EditCommand::UpdateFile { path, content } => self
                .update_file_content(&path, content)
                .map(|f| Some(f.into())),
            EditCommand::Rename { path, new_name } => self.rename(&path, &new_name).map(Some),
            EditCommand::Move { source, target_dir } => {
                self.move_node(&source, &target_dir).map(Some)
            }
            EditCommand::Delete { path } => self.delete(&path).map(|()| None),
        }
    }

    /// Returns `true` if `ancestor` is `id` itself or lies on its parent chain.
    fn has_ancestor(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.project.get(node_id).and_then(Node::parent_id);
        }
        false
    }

    fn cloned(&self, id: NodeId, path: &str) -> CoreResult<Node> {
        self.project
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(path.to_string()))
    }
}

/// Every file of `project`, sorted by path.
pub(crate) fn files_of(project: &Project) -> Vec<&FileNode> {
    let mut files: Vec<&FileNode> = project
        .nodes()
        .values()
        .filter_map(Node::as_file)
        .collect();
    files.sort_by(|a, b| a.path().cmp(b.path()));
    files
}

/// Collects `id` and all its descendants in pre-order.
fn subtree_ids(nodes: &NodeMap, id: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        out.push(current);
        if let Some(node) = nodes.get(&current) {
            stack.extend(node.children().iter().rev().copied());
        }
    }
    out
}

/// Recomputes cached paths top-down, starting with `id` at `path`.
fn rewrite_paths(nodes: &mut NodeMap, id: NodeId, path: String) {
    let mut stack = vec![(id, path)];
    while let Some((current, current_path)) = stack.pop() {
        let Some(node) = nodes.get_mut(&current) else {
            continue;
        };
        node.set_path(current_path.clone());
        let children = node.children().to_vec();
        for child_id in children {
            if let Some(child) = nodes.get(&child_id) {
                stack.push((child_id, path::child(&current_path, child.name())));
            }
        }
    }
}
