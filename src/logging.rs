//! Logger factory and timing helpers.
//!
//! A [`Logger`] is a fully assembled `tracing` dispatcher with an optional
//! file sink and an optional console sink. It can be installed process-wide
//! or used as a scoped default.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing::Dispatch;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_NAME_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H_%M_%S";

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Need to enable either file writing or console writing")]
    NoSink,

    #[error("Could not create log file {path:?}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A global logger is already installed")]
    AlreadyInstalled(#[from] tracing::dispatcher::SetGlobalDefaultError),
}

/// Settings for [`get_logger`]. Deserializable from the `logging` section of
/// the configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Directory the log file is created in.
    pub path: PathBuf,
    /// Prefix of the log file name.
    pub name: String,
    pub write_to_file: bool,
    pub write_to_console: bool,
    pub debug: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("logs"),
            name: "music_therapy".to_string(),
            write_to_file: true,
            write_to_console: true,
            debug: false,
        }
    }
}

pub struct Logger {
    name: String,
    log_file: Option<PathBuf>,
    level: LevelFilter,
    dispatch: Dispatch,
}

impl Logger {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the log file, if file writing is enabled.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn writes_to_file(&self) -> bool {
        self.log_file.is_some()
    }

    /// Makes this logger the process-wide default.
    pub fn install(self) -> Result<Self, LoggerError> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())?;
        Ok(self)
    }

    /// Runs `f` with this logger as the default for the current thread.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

fn log_file_path(config: &LoggerConfig) -> PathBuf {
    let stamp = chrono::Local::now().format(FILE_NAME_TIMESTAMP_FORMAT);
    config.path.join(format!("{}_{}.log", config.name, stamp))
}

/// Builds a logger writing to a timestamped file under `config.path` and/or
/// to stderr.
///
/// Fails when both sinks are disabled.
pub fn get_logger(config: &LoggerConfig) -> Result<Logger, LoggerError> {
    if !config.write_to_file && !config.write_to_console {
        return Err(LoggerError::NoSink);
    }

    let level = if config.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let (file_layer, log_file) = if config.write_to_file {
        let path = log_file_path(config);
        let file = fs::create_dir_all(&config.path)
            .and_then(|_| File::create(&path))
            .map_err(|source| LoggerError::LogFile {
                path: path.clone(),
                source,
            })?;
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
            .with_file(true)
            .with_line_number(true)
            .with_target(false);
        (Some(layer), Some(path))
    } else {
        (None, None)
    };

    let console_layer = config.write_to_console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
    });

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var("LOG_LEVEL")
        .from_env_lossy();

    let subscriber = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(filter);

    Ok(Logger {
        name: config.name.clone(),
        log_file,
        level,
        dispatch: Dispatch::new(subscriber),
    })
}

/// Formats a running time as `H:MM:SS`, dropping sub-second parts.
pub fn format_execution_time(elapsed: Duration) -> String {
    let total_seconds = elapsed.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    match days {
        0 => format!("{}:{:02}:{:02}", hours, minutes, seconds),
        1 => format!("1 day, {}:{:02}:{:02}", hours, minutes, seconds),
        _ => format!("{} days, {}:{:02}:{:02}", days, hours, minutes, seconds),
    }
}
