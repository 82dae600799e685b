use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::logging::LoggerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Config file {0:?} does not contain a mapping at the top level")]
    NotAMapping(PathBuf),
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub data: Option<DataConfig>,
    pub server: Option<ServerFileConfig>,
    pub logging: Option<LoggerConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct DataConfig {
    /// Path to the pre-trained emotion model.
    pub model_path: Option<String>,
    /// Name of the model input tensor.
    pub model_input: Option<String>,
    /// Root directory holding one song-list directory per emotion.
    #[serde(rename = "Songs")]
    pub songs: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ServerFileConfig {
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub frontend_dir_path: Option<String>,
    pub max_upload_mb: Option<usize>,
    pub content_cache_age_sec: Option<usize>,
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = read_file(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Reads a YAML file into an untyped mapping. An empty document yields an
/// empty mapping.
pub fn load_mapping(path: &Path) -> Result<serde_yaml::Mapping, ConfigError> {
    let content = read_file(path)?;
    if content.trim().is_empty() {
        return Ok(serde_yaml::Mapping::new());
    }
    let value: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    match value {
        serde_yaml::Value::Mapping(mapping) => Ok(mapping),
        serde_yaml::Value::Null => Ok(serde_yaml::Mapping::new()),
        _ => Err(ConfigError::NotAMapping(path.to_path_buf())),
    }
}
