//! Music Therapy library
//!
//! Face scan → emotion → song list. The modules are exposed for the binaries,
//! the end-to-end tests and reuse.

pub mod config;
pub mod database;
pub mod emotion;
pub mod logging;
pub mod playlist;
pub mod server;
pub mod table;

// Re-export commonly used types for convenience
pub use emotion::{Classifier, Emotion, EmotionModel, OnnxEmotionModel};
pub use playlist::PlaylistLibrary;
pub use server::{run_server, RequestsLoggingLevel};
pub use table::{CellValue, Table};
