//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own song library and a fake
//! emotion model, so no ONNX model file is needed.

use super::constants::*;
use super::fixtures::create_test_songs;
use music_therapy::emotion::{ClassifierError, EmotionModel};
use music_therapy::server::{make_app, RequestsLoggingLevel, ServerConfig};
use music_therapy::{Classifier, Emotion, PlaylistLibrary};
use ndarray::ArrayView4;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

fn midpoint(a: u8, b: u8) -> f32 {
    (f32::from(a) + f32::from(b)) / 2.0
}

/// Picks the emotion from the mean gray level of the preprocessed picture.
struct GrayLevelModel;

impl EmotionModel for GrayLevelModel {
    fn predict(&self, input: ArrayView4<'_, f32>) -> Result<Vec<f32>, ClassifierError> {
        let mean = input.mean().unwrap_or(0.0);
        let emotion = if mean < midpoint(ANGRY_GRAY, SAD_GRAY) {
            Emotion::Angry
        } else if mean < midpoint(SAD_GRAY, NEUTRAL_GRAY) {
            Emotion::Sad
        } else if mean < midpoint(NEUTRAL_GRAY, HAPPY_GRAY) {
            Emotion::Neutral
        } else {
            Emotion::Happy
        };

        let mut scores = vec![0.05; 4];
        scores[emotion.index()] = 0.85;
        Ok(scores)
    }
}

/// Test server instance with an isolated song library
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    #[allow(dead_code)]
    pub port: u16,

    // Private fields - keep resources alive until drop
    _temp_songs_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the fixtures cannot be created, the port cannot be bound or
    /// the server doesn't become ready within the timeout.
    pub async fn spawn() -> Self {
        let temp_songs_dir = create_test_songs().expect("Failed to create test songs");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            content_cache_age_sec: 0,
            frontend_dir_path: None,
            max_upload_bytes: 1024 * 1024,
        };

        let app = make_app(
            config,
            Classifier::new(Arc::new(GrayLevelModel)),
            Arc::new(PlaylistLibrary::new(temp_songs_dir.path())),
        )
        .expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            _temp_songs_dir: temp_songs_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the /v1/statics endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client
                .get(format!("{}/v1/statics", self.base_url))
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
