use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Settings handed to `arbor-core`.
    #[serde(default)]
    pub core: arbor_core::Config,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one `<project-id>.json` file per saved project.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            storage: StorageConfig::default(),
            limits: LimitsConfig::default(),
            core: arbor_core::Config::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size_mb: default_max_body_size_mb(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9090))
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("arbor-data")
}

fn default_max_body_size_mb() -> usize {
    16
}

impl ServerConfig {
    pub fn max_body_bytes(&self) -> usize {
        self.limits.max_body_size_mb.saturating_mul(1024 * 1024)
    }

    /// Path of the stored document for a project.
    pub fn project_file(&self, id: arbor_core::ProjectId) -> PathBuf {
        self.storage.data_dir.join(format!("{id}.json"))
    }

    /// Reads the TOML file named by `ARBOR_WEB_CONFIG` (defaults otherwise),
    /// then applies `ARBOR_*` environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("ARBOR_WEB_CONFIG").map(PathBuf::from).ok();

        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(&path)?;
            Self::parse(&contents)?
        } else {
            ServerConfig::default()
        };

        if let Ok(addr) = std::env::var("ARBOR_BIND_ADDR") {
            config.bind_addr = addr.parse()?;
        }
        if let Ok(dir) = std::env::var("ARBOR_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }
        if let Ok(val) = std::env::var("ARBOR_MAX_BODY_SIZE_MB") {
            if let Ok(mb) = val.parse::<usize>() {
                config.limits.max_body_size_mb = mb;
            }
        }

        if config.bind_addr.ip().is_unspecified() {
            tracing::warn!(
                "Listening on all interfaces ({}) without authentication. \
                 Anyone on the network can edit projects.",
                config.bind_addr
            );
        }

        Ok(config)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
