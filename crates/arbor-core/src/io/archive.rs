//! Archive import and export.
//!
//! An archive is a flat list of [`ArchiveEntry`]s using the usual zip
//! conventions: relative `/`-separated paths, directories marked with a
//! trailing separator. Reading and writing the actual archive bytes is
//! left to the host; this module only maps entries to and from a project.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::settings::ImportConfig;
use crate::error::{CoreError, CoreResult};
use crate::fs::content;
use crate::fs::node::Node;
use crate::fs::ops::{self, Engine, FileOptions};
use crate::fs::path;
use crate::fs::project::Project;

/// One archive member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub path: String,
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    pub fn file(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            data: data.into(),
        }
    }

    /// A directory entry; `path` gets a trailing separator if it lacks one.
    pub fn directory(path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.ends_with(path::SEPARATOR) {
            path.push(path::SEPARATOR);
        }
        Self {
            path,
            data: Vec::new(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.path.ends_with(path::SEPARATOR) || self.path.ends_with('\\')
    }
}

/// An entry left out of an import, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub path: String,
    pub reason: String,
}

/// Summary of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub files: usize,
    pub directories: usize,
    pub skipped: Vec<SkippedEntry>,
}

/// Builds a fresh project named `name` from archive entries.
///
/// Intermediate directories are created as needed. Entries with an
/// invalid or ignored name, or that collide with an earlier entry, are
/// skipped and listed in the report. Non-UTF-8 data is stored as a data
/// URI.
///
/// # Errors
///
/// Only internal failures are returned; bad entries never fail the import.
pub fn import<I>(name: &str, entries: I, config: &ImportConfig) -> CoreResult<(Project, ImportReport)>
where
    I: IntoIterator<Item = ArchiveEntry>,
{
    let mut project = Project::new(name);
    let mut report = ImportReport::default();
    let mut engine = Engine::new(&mut project);

    for entry in entries {
        if let Err(reason) = import_entry(&mut engine, &entry, config) {
            warn!(path = %entry.path, reason = %reason, "skipped archive entry");
            report.skipped.push(SkippedEntry {
                path: entry.path,
                reason,
            });
        }
    }

    for node in project.nodes().values() {
        match node {
            Node::File(_) => report.files += 1,
            Node::Directory(_) if node.parent_id().is_some() => report.directories += 1,
            Node::Directory(_) => {}
        }
    }
    debug!(
        files = report.files,
        directories = report.directories,
        skipped = report.skipped.len(),
        "imported archive"
    );
    Ok((project, report))
}

/// Imports one entry, returning the reason it was skipped on failure.
fn import_entry(engine: &mut Engine<'_>, entry: &ArchiveEntry, config: &ImportConfig) -> Result<(), String> {
    let raw = entry.path.replace('\\', "/");
    let segments: Vec<String> = path::segments(&raw).map(path::nfc_name).collect();
    if segments.is_empty() {
        return Err("empty path".to_string());
    }
    if let Some(ignored) = segments
        .iter()
        .find(|s| config.ignored_names.iter().any(|n| n == *s))
    {
        return Err(format!("ignored name {ignored:?}"));
    }
    for segment in &segments {
        path::validate_name(segment).map_err(|e| format!("{segment:?}: {e}"))?;
    }

    let full = path::join(path::ROOT, &segments[..]);
    if entry.is_dir() {
        engine.ensure_directory(&full).map_err(|e| e.to_string())?;
        return Ok(());
    }

    let parent = path::dirname(&full);
    let name = path::basename(&full, None);
    engine.ensure_directory(&parent).map_err(|e| e.to_string())?;

    let mime = binary_mime(&full, config);
    let (text, binary) = content::encode_bytes(&entry.data, &mime);
    let opts = FileOptions {
        binary: Some(binary),
        mime_type: binary.then_some(mime),
    };
    engine
        .create_file(&parent, &name, text, opts)
        .map_err(|e| match e {
            CoreError::AlreadyExists(_) => "duplicate entry".to_string(),
            other => other.to_string(),
        })?;
    Ok(())
}

fn binary_mime(path: &str, config: &ImportConfig) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| config.binary_mime_fallback.clone())
}

/// Lists every file of `project` as archive entries, plus one entry per
/// empty directory, sorted by path.
///
/// # Errors
///
/// - [`CoreError::Encoding`] if a binary file holds malformed base64.
pub fn export(project: &Project) -> CoreResult<Vec<ArchiveEntry>> {
    let mut entries = Vec::new();

    for file in ops::files_of(project) {
        let data = content::decode(file.content(), file.is_binary())?;
        entries.push(ArchiveEntry::file(relative(file.path()), data));
    }
    for node in project.nodes().values() {
        if node.is_dir() && node.parent_id().is_some() && node.children().is_empty() {
            entries.push(ArchiveEntry::directory(relative(node.path())));
        }
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn relative(path: &str) -> String {
    path.trim_start_matches(path::SEPARATOR).to_string()
}
