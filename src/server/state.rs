use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;

use crate::emotion::Classifier;
use crate::playlist::PlaylistLibrary;

use super::ServerConfig;

pub type GuardedPlaylistLibrary = Arc<PlaylistLibrary>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub classifier: Classifier,
    pub playlists: GuardedPlaylistLibrary,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        classifier: Classifier,
        playlists: GuardedPlaylistLibrary,
    ) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            classifier,
            playlists,
        }
    }
}

impl FromRef<ServerState> for Classifier {
    fn from_ref(input: &ServerState) -> Self {
        input.classifier.clone()
    }
}

impl FromRef<ServerState> for GuardedPlaylistLibrary {
    fn from_ref(input: &ServerState) -> Self {
        input.playlists.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
