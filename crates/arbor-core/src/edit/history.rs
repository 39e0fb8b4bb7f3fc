//! Linear undo/redo history built from node-map snapshots.
//!
//! Every recorded edit keeps a full copy of the node map before and after
//! it ran. Undo and redo swap those snapshots back into the project, so
//! restoring any point is exact regardless of how complex the edit was.
//! Recording a new edit after undoing discards the redo branch, the same
//! semantics as a text editor.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::settings::HistoryConfig;
use crate::error::{CoreError, CoreResult};
use crate::fs::diff::{diff, Change};
use crate::fs::ops::Engine;
use crate::fs::project::{NodeMap, Project};

/// Number of entries kept when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 100;

/// One recorded edit.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    description: String,
    changes: Vec<Change>,
    before: NodeMap,
    after: NodeMap,
    recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Structural delta between the two snapshots.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn before(&self) -> &NodeMap {
        &self.before
    }

    pub fn after(&self) -> &NodeMap {
        &self.after
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// Bounded, linear edit history for one project.
///
/// `current_index` points at the entry whose `after` snapshot matches the
/// project, or is `-1` when every retained entry has been undone.
///
/// # Examples
///
/// ```
/// use arbor_core::{FileOptions, History, Project};
///
/// let mut project = Project::new("demo");
/// let mut history = History::new();
/// history
///     .record(&mut project, "Create file /a.txt", |engine| {
///         engine.create_file("/", "a.txt", "hi", FileOptions::default())
///     })
///     .unwrap();
///
/// assert!(history.undo(&mut project));
/// assert_eq!(project.len(), 1);
/// assert!(history.redo(&mut project));
/// assert_eq!(project.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    current: isize,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl History {
    /// Creates an empty history with [`DEFAULT_CAPACITY`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty history keeping at most `capacity` entries.
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            current: -1,
            capacity: capacity.max(1),
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::with_capacity(config.capacity)
    }

    /// Runs `mutate` against `project` and records the result as one entry.
    ///
    /// If `mutate` fails the project is restored to its prior snapshot and
    /// nothing is recorded. An edit that leaves the node map unchanged is
    /// not recorded either.
    ///
    /// # Errors
    ///
    /// Whatever `mutate` returns.
    pub fn record<T, F>(
        &mut self,
        project: &mut Project,
        description: impl Into<String>,
        mutate: F,
    ) -> CoreResult<T>
    where
        F: FnOnce(&mut Engine<'_>) -> CoreResult<T>,
    {
        let description = description.into();
        let before = project.nodes().clone();

        let result = {
            let mut engine = Engine::new(project);
            mutate(&mut engine)
        };
        let value = match result {
            Ok(value) => value,
            Err(e) => {
                if project.nodes() != &before {
                    project.replace_nodes(before);
                }
                debug!(description = %description, error = %e, "edit failed, nothing recorded");
                return Err(e);
            }
        };

        let changes = diff(&before, project.nodes());
        if changes.is_empty() {
            debug!(description = %description, "edit changed nothing, not recorded");
            return Ok(value);
        }

        // A new edit discards everything that could have been redone.
        self.entries.truncate((self.current + 1) as usize);
        self.entries.push_back(HistoryEntry {
            description,
            changes,
            before,
            after: project.nodes().clone(),
            recorded_at: Utc::now(),
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.current = self.entries.len() as isize - 1;

        debug!(entries = self.entries.len(), "recorded history entry");
        Ok(value)
    }

    /// Steps back one entry. Returns `false` if there is nothing to undo.
    pub fn undo(&mut self, project: &mut Project) -> bool {
        if !self.can_undo() {
            return false;
        }
        let entry = &self.entries[self.current as usize];
        project.replace_nodes(entry.before.clone());
        info!(description = %entry.description, "undo");
        self.current -= 1;
        true
    }

    /// Steps forward one entry. Returns `false` if there is nothing to redo.
    pub fn redo(&mut self, project: &mut Project) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.current += 1;
        let entry = &self.entries[self.current as usize];
        project.replace_nodes(entry.after.clone());
        info!(description = %entry.description, "redo");
        true
    }

    /// Restores the state right after entry `index`.
    ///
    /// `-1` restores the state before the oldest retained entry, which is
    /// the same state repeated undo reaches.
    ///
    /// # Errors
    ///
    /// [`CoreError::HistoryIndexOutOfRange`] unless `-1 <= index < len`.
    pub fn jump_to(&mut self, project: &mut Project, index: isize) -> CoreResult<()> {
        let len = self.entries.len();
        if index < -1 || index >= len as isize {
            return Err(CoreError::HistoryIndexOutOfRange { index, len });
        }
        if index == self.current {
            return Ok(());
        }
        let snapshot = if index == -1 {
            self.entries.front().map(|e| &e.before)
        } else {
            self.entries.get(index as usize).map(|e| &e.after)
        };
        if let Some(snapshot) = snapshot {
            project.replace_nodes(snapshot.clone());
        }
        info!(from = self.current, to = index, "history jump");
        self.current = index;
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.current >= 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.entries.len() as isize
    }

    /// Index of the entry matching the project, `-1` if none.
    pub fn current_index(&self) -> isize {
        self.current
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retained entries, oldest first.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Drops every entry without touching any project.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current = -1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::ops::FileOptions;

    fn create(history: &mut History, project: &mut Project, name: &str) {
        history
            .record(project, format!("Create file /{name}"), |engine| {
                engine.create_file("/", name, name, FileOptions::default())
            })
            .unwrap();
    }

    #[test]
    fn new_history_is_empty() {
        let history = History::new();
        assert!(history.is_empty());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.current_index(), -1);
        assert_eq!(history.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn record_stores_changes_and_snapshots() {
        let mut project = Project::new("h");
        let mut history = History::new();
        create(&mut history, &mut project, "a.txt");

        assert_eq!(history.len(), 1);
        assert_eq!(history.current_index(), 0);
        let entry = history.entries().next().unwrap();
        assert_eq!(entry.description(), "Create file /a.txt");
        assert_eq!(entry.changes().len(), 1);
        assert_eq!(entry.before().len(), 1);
        assert_eq!(entry.after(), project.nodes());
    }

    #[test]
    fn undo_and_redo_restore_snapshots() {
        let mut project = Project::new("h");
        let mut history = History::new();
        let initial = project.nodes().clone();
        create(&mut history, &mut project, "a.txt");
        let after = project.nodes().clone();

        assert!(history.undo(&mut project));
        assert_eq!(project.nodes(), &initial);
        assert!(!history.undo(&mut project));

        assert!(history.redo(&mut project));
        assert_eq!(project.nodes(), &after);
        assert!(!history.redo(&mut project));
    }

    #[test]
    fn recording_after_undo_truncates_redo_branch() {
        let mut project = Project::new("h");
        let mut history = History::new();
        create(&mut history, &mut project, "a.txt");
        create(&mut history, &mut project, "b.txt");
        history.undo(&mut project);
        create(&mut history, &mut project, "c.txt");

        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        let labels: Vec<&str> = history.entries().map(HistoryEntry::description).collect();
        assert_eq!(labels, vec!["Create file /a.txt", "Create file /c.txt"]);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut project = Project::new("h");
        let mut history = History::with_capacity(2);
        for name in ["a", "b", "c"] {
            create(&mut history, &mut project, name);
        }
        assert_eq!(history.len(), 2);
        assert_eq!(history.current_index(), 1);
        assert_eq!(history.entries().next().unwrap().description(), "Create file /b");

        // Undoing everything lands on the oldest retained `before`, where /a exists.
        while history.undo(&mut project) {}
        let engine = Engine::new(&mut project);
        assert!(engine.resolve("/a").is_some());
        assert!(engine.resolve("/b").is_none());
    }

    #[test]
    fn failed_mutation_records_nothing_and_rolls_back() {
        let mut project = Project::new("h");
        let mut history = History::new();
        let initial = project.nodes().clone();

        let result = history.record(&mut project, "two creates", |engine| {
            engine.create_file("/", "a.txt", "", FileOptions::default())?;
            engine.create_file("/", "a.txt", "", FileOptions::default())
        });

        assert!(matches!(result, Err(CoreError::AlreadyExists(_))));
        assert!(history.is_empty());
        assert_eq!(project.nodes(), &initial);
    }

    #[test]
    fn no_op_edit_is_not_recorded() {
        let mut project = Project::new("h");
        let mut history = History::new();
        create(&mut history, &mut project, "a.txt");
        history
            .record(&mut project, "Rename", |engine| engine.rename("/a.txt", "a.txt"))
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn jump_to_moves_in_both_directions() {
        let mut project = Project::new("h");
        let mut history = History::new();
        let initial = project.nodes().clone();
        create(&mut history, &mut project, "a");
        let after_a = project.nodes().clone();
        create(&mut history, &mut project, "b");
        let after_b = project.nodes().clone();

        history.jump_to(&mut project, 0).unwrap();
        assert_eq!(project.nodes(), &after_a);
        assert!(history.can_redo());

        history.jump_to(&mut project, -1).unwrap();
        assert_eq!(project.nodes(), &initial);
        assert_eq!(history.current_index(), -1);

        history.jump_to(&mut project, 1).unwrap();
        assert_eq!(project.nodes(), &after_b);
    }

    #[test]
    fn jump_to_rejects_out_of_range() {
        let mut project = Project::new("h");
        let mut history = History::new();
        create(&mut history, &mut project, "a");

        assert!(matches!(
            history.jump_to(&mut project, 1),
            Err(CoreError::HistoryIndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(history.jump_to(&mut project, -2).is_err());
        assert_eq!(history.current_index(), 0);
    }

    #[test]
    fn undo_keeps_project_consistent() {
        let mut project = Project::new("h");
        let mut history = History::new();
        history
            .record(&mut project, "setup", |engine| {
                engine.create_directory("/", "src")?;
                engine.create_directory("/", "lib")?;
                engine.create_file("/src", "a.rs", "", FileOptions::default())
            })
            .unwrap();
        history
            .record(&mut project, "Move", |engine| engine.move_node("/src", "/lib"))
            .unwrap();

        history.undo(&mut project);
        project.verify().unwrap();
        assert!(Engine::new(&mut project).resolve("/src/a.rs").is_some());
    }

    #[test]
    fn clear_empties_history() {
        let mut project = Project::new("h");
        let mut history = History::new();
        create(&mut history, &mut project, "a");
        history.clear();
        assert!(history.is_empty());
        assert!(!history.can_undo());
    }

    #[test]
    fn zero_capacity_keeps_one_entry() {
        let history = History::with_capacity(0);
        assert_eq!(history.capacity(), 1);
    }
}
