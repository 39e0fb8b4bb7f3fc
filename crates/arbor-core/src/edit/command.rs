//! Serializable edit commands.
//!
//! Hosts translate user input into [`EditCommand`]s and hand them to
//! [`Engine::execute`](crate::fs::Engine::execute). Decoupling the request
//! from the engine lets any frontend (HTTP, scripted batches, tests) drive
//! the same core logic and label history entries consistently.

use serde::{Deserialize, Serialize};

/// A single structural edit on a project.
///
/// Commands flow **host → core**; the core never creates commands itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditCommand {
    /// Create a file named `name` inside the directory `parent`.
    CreateFile {
        parent: String,
        name: String,
        #[serde(default)]
        content: String,
        #[serde(default, rename = "mimeType", skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
    /// Create an empty directory named `name` inside `parent`.
    CreateDirectory { parent: String, name: String },
    /// Replace the content of the file at `path`.
    UpdateFile { path: String, content: String },
    /// Give the node at `path` a new name in the same directory.
    Rename {
        path: String,
        #[serde(rename = "newName")]
        new_name: String,
    },
    /// Move the node at `source` into the directory `target_dir`.
    Move {
        source: String,
        #[serde(rename = "targetDir")]
        target_dir: String,
    },
    /// Delete the node at `path` and its subtree.
    Delete { path: String },
}

impl EditCommand {
    /// Human-readable label, used as the history entry description.
    pub fn describe(&self) -> String {
        match self {
            EditCommand::CreateFile { parent, name, .. } => {
                format!("Create file {}", crate::fs::path::child(parent, name))
            }
            EditCommand::CreateDirectory { parent, name } => {
                format!("Create folder {}", crate::fs::path::child(parent, name))
            }
            EditCommand::UpdateFile { path, .. } => format!("Edit {path}"),
            EditCommand::Rename { path, new_name } => format!("Rename {path} to {new_name}"),
            EditCommand::Move { source, target_dir } => format!("Move {source} to {target_dir}"),
            EditCommand::Delete { path } => format!("Delete {path}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_from_tagged_json() {
        let cmd: EditCommand =
            serde_json::from_str(r#"{"op":"rename","path":"/a.txt","newName":"b.txt"}"#).unwrap();
        assert_eq!(
            cmd,
            EditCommand::Rename {
                path: "/a.txt".into(),
                new_name: "b.txt".into()
            }
        );
    }

    #[test]
    fn create_file_content_defaults_to_empty() {
        let cmd: EditCommand =
            serde_json::from_str(r#"{"op":"create_file","parent":"/","name":"x.md"}"#).unwrap();
        match cmd {
            EditCommand::CreateFile {
                content, mime_type, ..
            } => {
                assert!(content.is_empty());
                assert!(mime_type.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_op_is_rejected() {
        let result = serde_json::from_str::<EditCommand>(r#"{"op":"chmod","path":"/a"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn describe_labels() {
        let create = EditCommand::CreateFile {
            parent: "/src".into(),
            name: "main.rs".into(),
            content: String::new(),
            mime_type: None,
        };
        assert_eq!(create.describe(), "Create file /src/main.rs");

        let folder = EditCommand::CreateDirectory {
            parent: "/".into(),
            name: "docs".into(),
        };
        assert_eq!(folder.describe(), "Create folder /docs");

        let mv = EditCommand::Move {
            source: "/a.txt".into(),
            target_dir: "/lib".into(),
        };
        assert_eq!(mv.describe(), "Move /a.txt to /lib");

        let del = EditCommand::Delete { path: "/x".into() };
        assert_eq!(del.describe(), "Delete /x");
    }
}
