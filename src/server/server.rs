use anyhow::{Context, Result};
use std::sync::Arc;

use tracing::{debug, error, info};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::services::ServeDir;

use super::{http_cache, log_requests, state::*, ServerConfig};
use crate::emotion::{Classifier, ClassifierError, Emotion};
use crate::logging::format_execution_time;
use crate::playlist::{PlaylistError, PlaylistLibrary};
use crate::table::Table;

const INDEX_HTML: &str = include_str!("index.html");

/// Multipart field carrying the captured picture.
pub const IMAGE_FIELD: &str = "image";

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: &'static str,
    pub hash: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct EmotionInfo {
    label: Emotion,
    color: Option<&'static str>,
}

#[derive(Serialize)]
struct ScanResponse {
    emotion: Emotion,
    color: Option<&'static str>,
    songs: Table,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

enum ScanError {
    Classifier(ClassifierError),
    Playlist(PlaylistError),
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        match self {
            ScanError::Classifier(err @ ClassifierError::InvalidImage(_)) => {
                debug!("Rejected scan: {}", err);
                error_response(StatusCode::BAD_REQUEST, err.to_string())
            }
            ScanError::Classifier(err) => {
                error!("Emotion detection failed: {}", err);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ScanError::Playlist(err) => {
                error!("Song list lookup failed: {}", err);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

fn scan_image(
    classifier: &Classifier,
    playlists: &PlaylistLibrary,
    image: &[u8],
) -> Result<ScanResponse, ScanError> {
    let emotion = classifier
        .classify_image(image)
        .map_err(ScanError::Classifier)?;
    info!("Detected mood: {}", emotion);

    let songs = playlists
        .fetch_song_list(emotion)
        .map_err(ScanError::Playlist)?;

    Ok(ScanResponse {
        emotion,
        color: emotion.color(),
        songs,
    })
}

async fn home() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn get_statics(State(state): State<ServerState>) -> impl IntoResponse {
    Json(ServerStats {
        uptime: format_execution_time(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION"),
        hash: env!("GIT_HASH"),
    })
}

async fn get_emotions() -> impl IntoResponse {
    let emotions: Vec<EmotionInfo> = Emotion::ALL
        .iter()
        .map(|&label| EmotionInfo {
            label,
            color: label.color(),
        })
        .collect();
    Json(emotions)
}

async fn get_playlist(
    State(playlists): State<GuardedPlaylistLibrary>,
    Path(label): Path<String>,
) -> Response {
    let emotion: Emotion = match label.parse() {
        Ok(emotion) => emotion,
        Err(err) => return error_response(StatusCode::NOT_FOUND, format!("{}", err)),
    };

    let result = tokio::task::spawn_blocking(move || playlists.fetch_song_list(emotion)).await;
    match result {
        Ok(Ok(table)) => Json(table).into_response(),
        Ok(Err(err)) => ScanError::Playlist(err).into_response(),
        Err(err) => {
            error!("Song list task failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn read_image_field(multipart: &mut Multipart) -> Result<Option<Bytes>, Response> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(err) => return Err(error_response(err.status(), err.body_text())),
        };
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        return match field.bytes().await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) => Err(error_response(err.status(), err.body_text())),
        };
    }
}

async fn post_scan(State(state): State<ServerState>, mut multipart: Multipart) -> Response {
    let image = match read_image_field(&mut multipart).await {
        Ok(Some(image)) if !image.is_empty() => image,
        Ok(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Missing \"{}\" field", IMAGE_FIELD),
            )
        }
        Err(response) => return response,
    };
    debug!("Received {} bytes of image data", image.len());

    let classifier = state.classifier.clone();
    let playlists = state.playlists.clone();
    let result =
        tokio::task::spawn_blocking(move || scan_image(&classifier, &playlists, &image)).await;

    match result {
        Ok(Ok(scan)) => Json(scan).into_response(),
        Ok(Err(err)) => err.into_response(),
        Err(err) => {
            error!("Scan task failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    classifier: Classifier,
    playlists: GuardedPlaylistLibrary,
) -> Result<Router> {
    let state = ServerState::new(config.clone(), classifier, playlists);

    let scan_routes: Router = Router::new()
        .route("/scan", post(post_scan))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state.clone());

    let content_routes: Router = Router::new()
        .route("/emotions", get(get_emotions))
        .route("/playlist/{emotion}", get(get_playlist))
        .layer(middleware::from_fn_with_state(
            config.content_cache_age_sec,
            http_cache,
        ))
        .with_state(state.clone());

    let statics_routes: Router = Router::new()
        .route("/statics", get(get_statics))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new().route("/", get(home)),
    };

    let api_routes: Router = scan_routes.merge(content_routes).merge(statics_routes);

    let app: Router = home_router
        .nest("/v1", api_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Could not listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

pub async fn run_server(
    config: ServerConfig,
    classifier: Classifier,
    playlists: Arc<PlaylistLibrary>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, classifier, playlists)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Could not bind port {}", port))?;
    info!("Listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
