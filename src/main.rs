use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use music_therapy::config::{load_or_exit, AppConfig, CliConfig};
use music_therapy::logging::{format_execution_time, get_logger};
use music_therapy::server::{run_server, RequestsLoggingLevel, ServerConfig};
use music_therapy::{Classifier, OnnxEmotionModel, PlaylistLibrary};

/// Read when `--config` is not given and the file exists in the working directory.
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(version, about = "Scans a face and suggests songs for the detected mood")]
struct CliArgs {
    /// Path to the YAML configuration file. Values in the file take precedence
    /// over command line options.
    #[clap(short, long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the ONNX emotion model (data.model_path).
    #[clap(long, value_parser = parse_path)]
    pub model_path: Option<PathBuf>,

    /// Directory holding one song list folder per emotion (data.Songs).
    #[clap(long, value_parser = parse_path)]
    pub songs_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8501)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// The maximum age of song lists in the browser cache in seconds.
    #[clap(long, default_value_t = 60)]
    pub content_cache_age_sec: usize,

    /// Path to the frontend directory to be statically served instead of the
    /// built-in capture page.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Largest accepted picture upload, in megabytes.
    #[clap(long, default_value_t = 10)]
    pub max_upload_mb: usize,
}

fn config_path(cli_args: &CliArgs) -> Option<PathBuf> {
    cli_args.config.clone().or_else(|| {
        let default = Path::new(DEFAULT_CONFIG_FILE);
        default.is_file().then(|| default.to_path_buf())
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli_args = CliArgs::parse();

    let file_config = config_path(&cli_args).map(|path| load_or_exit(&path));
    let cli_config = CliConfig {
        model_path: cli_args.model_path.clone(),
        songs_path: cli_args.songs_path.clone(),
        port: cli_args.port,
        logging_level: cli_args.logging_level.clone(),
        frontend_dir_path: cli_args.frontend_dir_path.clone(),
        max_upload_mb: cli_args.max_upload_mb,
        content_cache_age_sec: cli_args.content_cache_age_sec,
    };
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    let logger = get_logger(&app_config.logging)
        .context("Could not set up logging")?
        .install()?;
    if let Some(log_file) = logger.log_file() {
        info!("Writing logs to {:?}", log_file);
    }

    info!("Loading emotion model from {:?}...", app_config.model_path);
    let model = OnnxEmotionModel::load(&app_config.model_path, &app_config.model_input)
        .context("Could not load the emotion model")?;
    let classifier = Classifier::new(Arc::new(model));

    info!("Song lists from {:?}", app_config.songs_path);
    let playlists = Arc::new(PlaylistLibrary::new(&app_config.songs_path));

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level,
        port: app_config.port,
        content_cache_age_sec: app_config.content_cache_age_sec,
        frontend_dir_path: app_config.frontend_dir_path,
        max_upload_bytes: app_config.max_upload_bytes,
    };

    info!("Ready in {}", format_execution_time(start.elapsed()));
    run_server(server_config, classifier, playlists).await?;

    info!("Total execution time: {}", format_execution_time(start.elapsed()));
    Ok(())
}
