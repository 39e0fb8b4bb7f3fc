//! Core configuration loaded from a TOML file.
//!
//! The default configuration matches the values shown in `config/default.toml`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::edit::plan::CreatePolicy;
use crate::error::{CoreError, CoreResult};

/// Top-level core configuration.
///
/// All fields have sensible defaults so Arbor works without a config file.
/// Call [`Config::load`] to read from a TOML path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub plan: PlanConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

impl Config {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::PermissionDenied`] if the file is not readable.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound(path.display().to_string()),
            std::io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path.to_path_buf()),
            _ => CoreError::Io(e),
        })?;
        toml::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))
    }
}

/// Undo/redo history settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

/// Change-plan application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConfig {
    #[serde(default)]
    pub create_policy: CreatePolicy,
    #[serde(default)]
    pub create_parents: bool,
    /// Directories a plan may touch. Empty allows the whole project.
    #[serde(default)]
    pub allowed_roots: Vec<String>,
}

/// Archive import settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Entry names skipped on import, wherever they appear in a path.
    #[serde(default = "default_ignored_names")]
    pub ignored_names: Vec<String>,
    #[serde(default = "default_binary_mime")]
    pub binary_mime_fallback: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            ignored_names: default_ignored_names(),
            binary_mime_fallback: default_binary_mime(),
        }
    }
}

fn default_history_capacity() -> usize {
    crate::edit::history::DEFAULT_CAPACITY
}

fn default_ignored_names() -> Vec<String> {
    [".DS_Store", "Thumbs.db", "desktop.ini", "__MACOSX"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_binary_mime() -> String {
    crate::fs::content::OCTET_STREAM.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_config_history() {
        let config = Config::default();
        assert_eq!(config.history.capacity, 100);
    }

    #[test]
    fn default_config_plan() {
        let config = Config::default();

        assert_eq!(config.plan.create_policy, CreatePolicy::CreateOrUpdate);
        assert!(!config.plan.create_parents);
        assert!(config.plan.allowed_roots.is_empty());
    }

    #[test]
    fn default_config_import() {
        let config = Config::default();

        assert!(config.import.ignored_names.iter().any(|n| n == ".DS_Store"));
        assert!(config.import.ignored_names.iter().any(|n| n == "__MACOSX"));
        assert_eq!(config.import.binary_mime_fallback, "application/octet-stream");
    }

    #[test]
    fn load_full_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[history]
capacity = 25

[plan]
create_policy = "strict"
create_parents = true
allowed_roots = ["/src", "/docs"]

[import]
ignored_names = [".git"]
binary_mime_fallback = "application/x-unknown"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.history.capacity, 25);

        assert_eq!(config.plan.create_policy, CreatePolicy::Strict);
        assert!(config.plan.create_parents);
        assert_eq!(config.plan.allowed_roots, vec!["/src", "/docs"]);

        assert_eq!(config.import.ignored_names, vec![".git"]);
        assert_eq!(config.import.binary_mime_fallback, "application/x-unknown");
    }

    #[test]
    fn load_partial_toml_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[plan]
create_parents = true
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert!(config.plan.create_parents);
        assert_eq!(config.plan.create_policy, CreatePolicy::CreateOrUpdate);
        assert_eq!(config.history.capacity, 100);
        assert_eq!(config.import, ImportConfig::default());
    }

    #[test]
    fn load_empty_toml_uses_all_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_nonexistent_returns_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = Config::load(&tmp.path().join("nonexistent.toml"));
        assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
    }

    #[test]
    fn load_invalid_toml_returns_config_parse() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is not valid [[[toml").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result.unwrap_err(), CoreError::ConfigParse(_)));
    }

    #[test]
    fn unknown_create_policy_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[plan]\ncreate_policy = \"sometimes\"\n").unwrap();

        assert!(matches!(
            Config::load(&path).unwrap_err(),
            CoreError::ConfigParse(_)
        ));
    }

    #[test]
    fn bundled_default_toml_matches_defaults() {
        let bundled: Config = toml::from_str(include_str!("../../../../config/default.toml")).unwrap();
        assert_eq!(bundled, Config::default());
    }
}
