//! Tolerant application of externally authored change plans.
//!
//! A plan is an ordered list of file-level [`ChangeIntent`]s, typically
//! produced by an assistant. Every item is validated and applied on its
//! own; a failing item is logged and collected in the [`PlanReport`]
//! while the remaining items still run.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::settings::PlanConfig;
use crate::error::{CoreError, CoreResult};
use crate::fs::ops::{Engine, FileOptions};
use crate::fs::path;

/// What a [`ChangeIntent`] asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    Create,
    Update,
    Delete,
}

/// One item of a change plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeIntent {
    #[serde(rename = "type")]
    pub kind: IntentKind,
    pub path: String,
    /// New file content. Missing content on `create`/`update` writes an
    /// empty file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChangeIntent {
    pub fn create(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: IntentKind::Create,
            path: path.into(),
            content: Some(content.into()),
        }
    }

    pub fn update(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: IntentKind::Update,
            path: path.into(),
            content: Some(content.into()),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            kind: IntentKind::Delete,
            path: path.into(),
            content: None,
        }
    }
}

/// How a `create` intent treats a path that already holds a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatePolicy {
    /// Fail with [`CoreError::AlreadyExists`].
    Strict,
    /// Overwrite the existing file's content.
    #[default]
    CreateOrUpdate,
}

/// Allow-list deciding which paths a plan may touch.
#[derive(Clone, Default)]
pub enum PathPolicy {
    #[default]
    AllowAll,
    /// The path must equal or lie under one of these directories.
    Roots(Vec<String>),
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl PathPolicy {
    pub fn roots<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Roots(roots.into_iter().map(|r| path::normalize(r.as_ref())).collect())
    }

    pub fn custom(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(predicate))
    }

    /// Checks a normalized path against the policy.
    pub fn allows(&self, path: &str) -> bool {
        match self {
            PathPolicy::AllowAll => true,
            PathPolicy::Roots(roots) => roots.iter().any(|root| path::is_within(root, path)),
            PathPolicy::Custom(predicate) => predicate(path),
        }
    }
}

impl fmt::Debug for PathPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPolicy::AllowAll => f.write_str("AllowAll"),
            PathPolicy::Roots(roots) => f.debug_tuple("Roots").field(roots).finish(),
            PathPolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Knobs for [`apply_plan`].
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub create_policy: CreatePolicy,
    /// Create missing parent directories for `create` intents.
    pub create_parents: bool,
    pub allow: PathPolicy,
}

impl PlanOptions {
    pub fn from_config(config: &PlanConfig) -> Self {
        let allow = if config.allowed_roots.is_empty() {
            PathPolicy::AllowAll
        } else {
            PathPolicy::roots(&config.allowed_roots)
        };
        Self {
            create_policy: config.create_policy,
            create_parents: config.create_parents,
            allow,
        }
    }
}

/// What a successful item did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedIntent {
    pub index: usize,
    pub path: String,
    pub outcome: Outcome,
}

/// A failed plan item.
#[derive(Debug)]
pub struct PlanItemError {
    pub index: usize,
    pub path: String,
    pub error: CoreError,
}

/// Result of applying a whole plan.
#[derive(Debug, Default)]
pub struct PlanReport {
    /// At least one item succeeded.
    pub changed: bool,
    pub applied: Vec<AppliedIntent>,
    pub errors: Vec<PlanItemError>,
}

impl PlanReport {
    /// Every item succeeded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Applies `intents` in order, collecting per-item failures instead of
/// stopping at the first one.
///
/// Wrap the call in [`History::record`](crate::edit::History::record) to
/// make the whole batch a single undoable entry.
pub fn apply_plan(engine: &mut Engine<'_>, intents: &[ChangeIntent], options: &PlanOptions) -> PlanReport {
    let mut report = PlanReport::default();

    for (index, intent) in intents.iter().enumerate() {
        let path = path::normalize(&intent.path);
        match apply_one(engine, intent, &path, options) {
            Ok(outcome) => {
                debug!(index, path = %path, ?outcome, "applied plan item");
                report.applied.push(AppliedIntent {
                    index,
                    path,
                    outcome,
                });
            }
            Err(error) => {
                warn!(index, path = %path, error = %error, "plan item failed");
                report.errors.push(PlanItemError { index, path, error });
            }
        }
    }

    report.changed = !report.applied.is_empty();
    if report.changed {
        engine.touch_project();
    }
    report
}

fn apply_one(
    engine: &mut Engine<'_>,
    intent: &ChangeIntent,
    path: &str,
    options: &PlanOptions,
) -> CoreResult<Outcome> {
    if !options.allow.allows(path) {
        return Err(CoreError::PathNotAllowed(path.to_string()));
    }
    let content = intent.content.clone().unwrap_or_default();

    match intent.kind {
        IntentKind::Create => {
            if let Some(existing) = engine.resolve(path) {
                if existing.is_file() && options.create_policy == CreatePolicy::CreateOrUpdate {
                    engine.update_file_content(path, content)?;
                    return Ok(Outcome::Updated);
                }
                return Err(CoreError::AlreadyExists(path.to_string()));
            }
            let (parent, name) =
                path::split(path).ok_or_else(|| CoreError::AlreadyExists(path.to_string()))?;
            if options.create_parents {
                // Reject the leaf before any parent gets created.
                let name = path::nfc_name(&name);
                path::validate_name(&name).map_err(|reason| CoreError::invalid_name(&name, reason))?;
                engine.ensure_directory(&parent)?;
            }
            engine.create_file(&parent, &name, content, FileOptions::default())?;
            Ok(Outcome::Created)
        }
        IntentKind::Update => {
            let node = engine
                .resolve(path)
                .ok_or_else(|| CoreError::NotFound(path.to_string()))?;
            if !node.is_file() {
                return Err(CoreError::NotAFile(path.to_string()));
            }
            engine.update_file_content(path, content)?;
            Ok(Outcome::Updated)
        }
        IntentKind::Delete => {
            if engine.resolve(path).is_none() {
                return Err(CoreError::NotFound(path.to_string()));
            }
            engine.delete(path)?;
            Ok(Outcome::Deleted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::history::History;
    use crate::error::ErrorKind;
    use crate::fs::project::Project;

    fn run(project: &mut Project, intents: &[ChangeIntent], options: &PlanOptions) -> PlanReport {
        apply_plan(&mut Engine::new(project), intents, options)
    }

    #[test]
    fn failing_item_does_not_stop_the_batch() {
        let mut project = Project::new("plan");
        let report = run(
            &mut project,
            &[
                ChangeIntent::update("/missing.txt", "y"),
                ChangeIntent::create("/ok.txt", "z"),
            ],
            &PlanOptions::default(),
        );

        assert!(report.changed);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].index, 0);
        assert_eq!(report.errors[0].error.kind(), ErrorKind::NotFound);

        let engine = Engine::new(&mut project);
        assert_eq!(engine.read_file("/ok.txt").unwrap().content(), "z");
    }

    #[test]
    fn create_on_existing_file_updates_by_default() {
        let mut project = Project::new("plan");
        run(&mut project, &[ChangeIntent::create("/a.txt", "1")], &PlanOptions::default());
        let report = run(&mut project, &[ChangeIntent::create("/a.txt", "2")], &PlanOptions::default());

        assert!(report.is_clean());
        assert_eq!(report.applied[0].outcome, Outcome::Updated);
        assert_eq!(Engine::new(&mut project).read_file("/a.txt").unwrap().content(), "2");
    }

    #[test]
    fn strict_policy_rejects_existing_file() {
        let mut project = Project::new("plan");
        run(&mut project, &[ChangeIntent::create("/a.txt", "1")], &PlanOptions::default());
        let options = PlanOptions {
            create_policy: CreatePolicy::Strict,
            ..PlanOptions::default()
        };
        let report = run(&mut project, &[ChangeIntent::create("/a.txt", "2")], &options);

        assert!(!report.changed);
        assert!(matches!(report.errors[0].error, CoreError::AlreadyExists(_)));
        assert_eq!(Engine::new(&mut project).read_file("/a.txt").unwrap().content(), "1");
    }

    #[test]
    fn create_over_directory_fails_under_both_policies() {
        let mut project = Project::new("plan");
        Engine::new(&mut project).create_directory("/", "src").unwrap();
        let report = run(&mut project, &[ChangeIntent::create("/src", "x")], &PlanOptions::default());
        assert!(matches!(report.errors[0].error, CoreError::AlreadyExists(_)));
    }

    #[test]
    fn missing_parent_fails_without_create_parents() {
        let mut project = Project::new("plan");
        let report = run(&mut project, &[ChangeIntent::create("/a/b/c.txt", "")], &PlanOptions::default());
        assert!(matches!(report.errors[0].error, CoreError::ParentNotFound(_)));
        assert_eq!(project.len(), 1);
    }

    #[test]
    fn create_parents_builds_directories() {
        let mut project = Project::new("plan");
        let options = PlanOptions {
            create_parents: true,
            ..PlanOptions::default()
        };
        let report = run(&mut project, &[ChangeIntent::create("/a/b/c.txt", "hi")], &options);
        assert!(report.is_clean());
        let engine = Engine::new(&mut project);
        assert!(engine.resolve("/a/b").unwrap().is_dir());
        assert_eq!(engine.read_file("/a/b/c.txt").unwrap().content(), "hi");
    }

    #[test]
    fn create_parents_leaves_tree_alone_on_bad_leaf() {
        let mut project = Project::new("plan");
        let options = PlanOptions {
            create_parents: true,
            ..PlanOptions::default()
        };
        let report = run(&mut project, &[ChangeIntent::create("/a/b/..", "")], &options);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(project.len(), 1);
    }

    #[test]
    fn update_on_directory_is_rejected() {
        let mut project = Project::new("plan");
        Engine::new(&mut project).create_directory("/", "src").unwrap();
        let report = run(&mut project, &[ChangeIntent::update("/src", "x")], &PlanOptions::default());
        assert!(matches!(report.errors[0].error, CoreError::NotAFile(_)));
    }

    #[test]
    fn delete_missing_and_existing() {
        let mut project = Project::new("plan");
        run(&mut project, &[ChangeIntent::create("/a.txt", "")], &PlanOptions::default());
        let report = run(
            &mut project,
            &[ChangeIntent::delete("/a.txt"), ChangeIntent::delete("/a.txt")],
            &PlanOptions::default(),
        );
        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.applied[0].outcome, Outcome::Deleted);
        assert!(matches!(report.errors[0].error, CoreError::NotFound(_)));
    }

    #[test]
    fn root_allow_list_filters_paths() {
        let mut project = Project::new("plan");
        Engine::new(&mut project).create_directory("/", "src").unwrap();
        let options = PlanOptions {
            allow: PathPolicy::roots(["/src"]),
            ..PlanOptions::default()
        };
        let report = run(
            &mut project,
            &[
                ChangeIntent::create("/src/a.rs", ""),
                ChangeIntent::create("/secrets.env", ""),
                ChangeIntent::create("/srcx.rs", ""),
            ],
            &options,
        );
        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.errors.len(), 2);
        assert!(report
            .errors
            .iter()
            .all(|e| matches!(e.error, CoreError::PathNotAllowed(_))));
    }

    #[test]
    fn custom_predicate_sees_normalized_path() {
        let mut project = Project::new("plan");
        let options = PlanOptions {
            allow: PathPolicy::custom(|p| p.ends_with(".md")),
            ..PlanOptions::default()
        };
        let report = run(
            &mut project,
            &[ChangeIntent::create("notes.md/", ""), ChangeIntent::create("/a.rs", "")],
            &options,
        );
        assert_eq!(report.applied[0].path, "/notes.md");
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn nothing_applied_leaves_updated_at() {
        let mut project = Project::new("plan");
        let before = project.updated_at();
        let report = run(&mut project, &[ChangeIntent::delete("/nope")], &PlanOptions::default());
        assert!(!report.changed);
        assert_eq!(project.updated_at(), before);
    }

    #[test]
    fn missing_content_means_empty_file() {
        let intent: ChangeIntent = serde_json::from_str(r#"{"type":"create","path":"/a.txt"}"#).unwrap();
        assert_eq!(intent.kind, IntentKind::Create);
        let mut project = Project::new("plan");
        run(&mut project, &[intent], &PlanOptions::default());
        assert_eq!(Engine::new(&mut project).read_file("/a.txt").unwrap().size(), 0);
    }

    #[test]
    fn plan_inside_history_is_one_undo_step() {
        let mut project = Project::new("plan");
        let mut history = History::new();
        let intents = [ChangeIntent::create("/a.txt", "a"), ChangeIntent::create("/b.txt", "b")];
        let report = history
            .record(&mut project, "Apply plan", |engine| {
                Ok(apply_plan(engine, &intents, &PlanOptions::default()))
            })
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(history.len(), 1);

        history.undo(&mut project);
        assert_eq!(project.len(), 1);
    }

    #[test]
    fn options_from_config() {
        let config = PlanConfig {
            create_policy: CreatePolicy::Strict,
            create_parents: true,
            allowed_roots: vec!["src/".to_string()],
        };
        let options = PlanOptions::from_config(&config);
        assert_eq!(options.create_policy, CreatePolicy::Strict);
        assert!(options.create_parents);
        assert!(options.allow.allows("/src/main.rs"));
        assert!(!options.allow.allows("/main.rs"));

        let open = PlanOptions::from_config(&PlanConfig::default());
        assert!(matches!(open.allow, PathPolicy::AllowAll));
    }
}
