//! Project (de)serialization for the storage layer.
//!
//! Projects are stored as JSON. The node map is written as a list of
//! `[id, node]` pairs ordered by id and timestamps as ISO-8601 strings.
//! Where the bytes end up (disk, IndexedDB, object store) is the caller's
//! business.

use tracing::info;

use crate::error::CoreResult;
use crate::fs::project::Project;

/// Encodes `project` as JSON bytes.
///
/// # Errors
///
/// - [`CoreError::Serialization`](crate::CoreError::Serialization) if encoding fails.
pub fn serialize(project: &Project) -> CoreResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(project)?)
}

/// Decodes a project and checks its tree invariants.
///
/// # Errors
///
/// - [`CoreError::Serialization`](crate::CoreError::Serialization) if the bytes are not a project document.
/// - [`CoreError::Corrupt`](crate::CoreError::Corrupt) if the tree is structurally invalid.
pub fn deserialize(bytes: &[u8]) -> CoreResult<Project> {
    let project: Project = serde_json::from_slice(bytes)?;
    project.verify()?;
    info!(id = %project.id(), nodes = project.len(), "loaded project");
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::fs::content;
    use crate::fs::ops::{Engine, FileOptions};

    fn sample() -> Project {
        let mut project = Project::new("persist");
        let mut engine = Engine::new(&mut project);
        engine.create_directory("/", "src").unwrap();
        engine
            .create_file("/src", "main.rs", "fn main() {}", FileOptions::default())
            .unwrap();
        engine
            .create_file(
                "/",
                "logo.png",
                content::encode_binary(&[0x89, 0x50, 0x4e, 0x47], "image/png"),
                FileOptions::default(),
            )
            .unwrap();
        project
    }

    #[test]
    fn round_trip_preserves_everything() {
        let project = sample();
        let bytes = serialize(&project).unwrap();
        let back = deserialize(&bytes).unwrap();

        assert_eq!(back.id(), project.id());
        assert_eq!(back.name(), project.name());
        assert_eq!(back.root_id(), project.root_id());
        assert_eq!(back.nodes(), project.nodes());
        assert_eq!(back.created_at(), project.created_at());
        assert_eq!(back.updated_at(), project.updated_at());
    }

    #[test]
    fn document_shape() {
        let project = sample();
        let json: serde_json::Value = serde_json::from_slice(&serialize(&project).unwrap()).unwrap();

        assert_eq!(json["name"], "persist");
        assert!(json["rootId"].is_string());
        let nodes = json["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), project.len());
        assert!(nodes[0][0].is_string());
        assert!(nodes[0][1]["type"].is_string());
    }

    #[test]
    fn garbage_is_a_serialization_error() {
        assert!(matches!(
            deserialize(b"not json").unwrap_err(),
            CoreError::Serialization(_)
        ));
    }

    #[test]
    fn inconsistent_paths_are_corrupt() {
        let project = sample();
        let text = String::from_utf8(serialize(&project).unwrap()).unwrap();
        let tampered = text.replace("\"/src/main.rs\"", "\"/elsewhere/main.rs\"");

        assert!(matches!(
            deserialize(tampered.as_bytes()).unwrap_err(),
            CoreError::Corrupt(_)
        ));
    }
}
