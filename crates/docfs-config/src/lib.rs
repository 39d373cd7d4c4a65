mod defaults;
mod env;
pub mod types;
mod validation;

use std::path::{Path, PathBuf};

pub use env::interpolate_env;
pub use types::*;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Missing environment variables: {0:?}")]
    MissingEnvVars(Vec<String>),

    #[error("Duplicate mount alias: {0}")]
    DuplicateMount(String),

    #[error("Invalid mount '{0}': {1}")]
    InvalidMount(String, String),

    #[error("Invalid proxy endpoint '{0}': {1}")]
    InvalidEndpoint(String, String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DocfsConfig {
    /// Parse a DocFS configuration from a YAML string.
    /// Environment variables in the format `${VAR_NAME}` will be interpolated.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let interpolated = env::interpolate_env(yaml)?;
        let config: DocfsConfig = serde_yaml::from_str(&interpolated)?;
        Ok(config)
    }

    /// Load a DocFS configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Serialize back to YAML. Connection strings are redacted.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "DOCFS_CONFIG";

/// Locate a config file.
///
/// Search order: `explicit`, `$DOCFS_CONFIG`, `./docfs.yaml`,
/// `<config dir>/docfs/config.yaml`. Returns `None` when nothing exists, in
/// which case callers fall back to [`DocfsConfig::default`].
pub fn find_config(explicit: Option<&Path>, config_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let local = PathBuf::from("docfs.yaml");
    if local.exists() {
        return Some(local);
    }

    let user = config_dir?.join("docfs").join("config.yaml");
    if user.exists() {
        return Some(user);
    }

    None
}
