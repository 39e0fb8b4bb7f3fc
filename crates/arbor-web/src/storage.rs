//! On-disk persistence of projects, one JSON document per project.

use std::io::ErrorKind;

use arbor_core::{persist, CoreError, Project, ProjectId};
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::error::AppError;

/// Writes `project` to its file, replacing any previous version.
pub async fn save(config: &ServerConfig, project: &Project) -> Result<(), AppError> {
    let bytes = persist::serialize(project)?;
    tokio::fs::create_dir_all(&config.storage.data_dir).await?;

    let path = config.project_file(project.id());
    // Write-then-rename so a crash never leaves a half-written document.
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, &path).await?;

    debug!(id = %project.id(), bytes = bytes.len(), "saved project");
    Ok(())
}

pub async fn load(config: &ServerConfig, id: ProjectId) -> Result<Project, AppError> {
    let path = config.project_file(id);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("Project not found: {id}")));
        }
        Err(e) => return Err(e.into()),
    };
    let project = persist::deserialize(&bytes)?;
    if project.id() != id {
        return Err(AppError::Internal(format!(
            "{} holds project {}",
            path.display(),
            project.id()
        )));
    }
    Ok(project)
}

/// Every readable project in the data directory. Unreadable files are
/// logged and skipped.
pub async fn stored(config: &ServerConfig) -> Result<Vec<Project>, AppError> {
    let mut read_dir = match tokio::fs::read_dir(&config.storage.data_dir).await {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut projects = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let loaded = tokio::fs::read(&path)
            .await
            .map_err(CoreError::from)
            .and_then(|bytes| persist::deserialize(&bytes));
        match loaded {
            Ok(project) => projects.push(project),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable project file"),
        }
    }
    Ok(projects)
}

/// Deletes the stored document. Returns `false` if there was none.
pub async fn remove(config: &ServerConfig, id: ProjectId) -> Result<bool, AppError> {
    match tokio::fs::remove_file(config.project_file(id)).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(tmp: &TempDir) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.storage.data_dir = tmp.path().join("data");
        config
    }

    #[tokio::test]
    async fn save_load_remove() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        let project = Project::new("stored");

        save(&config, &project).await.unwrap();
        let loaded = load(&config, project.id()).await.unwrap();
        assert_eq!(loaded, project);

        assert_eq!(stored(&config).await.unwrap().len(), 1);
        assert!(remove(&config, project.id()).await.unwrap());
        assert!(!remove(&config, project.id()).await.unwrap());
        assert!(matches!(
            load(&config, project.id()).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn missing_data_dir_lists_nothing() {
        let tmp = TempDir::new().unwrap();
        assert!(stored(&config_in(&tmp)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn garbage_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        save(&config, &Project::new("good")).await.unwrap();
        std::fs::write(config.storage.data_dir.join("junk.json"), "{").unwrap();
        std::fs::write(config.storage.data_dir.join("notes.txt"), "hi").unwrap();

        let projects = stored(&config).await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name(), "good");
    }
}
