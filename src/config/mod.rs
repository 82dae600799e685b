mod file_config;

pub use file_config::{load_mapping, ConfigError, DataConfig, FileConfig, ServerFileConfig};

use crate::logging::LoggerConfig;
use crate::server::RequestsLoggingLevel;
use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL_INPUT: &str = "input";

/// CLI arguments that can be used for config resolution.
/// Values present in the YAML file take precedence over these.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub model_path: Option<PathBuf>,
    pub songs_path: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub max_upload_mb: usize,
    pub content_cache_age_sec: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Data
    pub model_path: PathBuf,
    pub model_input: String,
    pub songs_path: PathBuf,

    // Server
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub max_upload_bytes: usize,
    pub content_cache_age_sec: usize,

    pub logging: LoggerConfig,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and the optional YAML file.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();
        let data = file.data.unwrap_or_default();
        let server = file.server.unwrap_or_default();

        let model_path = data
            .model_path
            .map(PathBuf::from)
            .or_else(|| cli.model_path.clone())
            .ok_or_else(|| {
                anyhow!("data.model_path must be specified via --model-path or in config file")
            })?;

        let songs_path = data
            .songs
            .map(PathBuf::from)
            .or_else(|| cli.songs_path.clone())
            .ok_or_else(|| {
                anyhow!("data.Songs must be specified via --songs-path or in config file")
            })?;

        if !songs_path.exists() {
            bail!("Songs directory does not exist: {:?}", songs_path);
        }
        if !songs_path.is_dir() {
            bail!("Songs path is not a directory: {:?}", songs_path);
        }

        let model_input = data
            .model_input
            .unwrap_or_else(|| DEFAULT_MODEL_INPUT.to_string());

        let port = server.port.unwrap_or(cli.port);
        let logging_level = server
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());
        let frontend_dir_path = server
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());
        let max_upload_mb = server.max_upload_mb.unwrap_or(cli.max_upload_mb);
        let content_cache_age_sec = server
            .content_cache_age_sec
            .unwrap_or(cli.content_cache_age_sec);
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow!("server.max_upload_mb is too large: {}", max_upload_mb))?;

        Ok(Self {
            model_path,
            model_input,
            songs_path,
            port,
            logging_level,
            frontend_dir_path,
            max_upload_bytes,
            content_cache_age_sec,
            logging: file.logging.unwrap_or_default(),
        })
    }
}

/// Loads the configuration file, terminating the process when it cannot be
/// read or parsed.
pub fn load_or_exit(path: &Path) -> FileConfig {
    match FileConfig::load(path) {
        Ok(config) => config,
        Err(err) => {
            // The logger is configured from this very file, so stderr is all we have.
            eprintln!("{}", err);
            std::process::exit(1);
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
