//! Emotion → song list lookup.
//!
//! Song lists live under a root directory with one subdirectory per emotion
//! label (`Angry/`, `Happy/`, ...). The first spreadsheet in that directory is
//! the list for the emotion.

mod sheet;

pub use sheet::read_sheet;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::emotion::Emotion;
use crate::table::{Table, TableError};

/// Identifier column removed before a song list is shown.
pub const ID_COLUMN: &str = "ID";

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("Song list directory not found: {0:?}")]
    DirectoryNotFound(PathBuf),

    #[error("No song list file in {0:?}")]
    NoSongList(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported song list format: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("Could not read song list {path:?}: {message}")]
    Sheet { path: PathBuf, message: String },

    #[error("Song list {path:?}: {source}")]
    Table {
        path: PathBuf,
        #[source]
        source: TableError,
    },
}

pub struct PlaylistLibrary {
    songs_root: PathBuf,
}

impl PlaylistLibrary {
    pub fn new(songs_root: impl Into<PathBuf>) -> Self {
        Self {
            songs_root: songs_root.into(),
        }
    }

    pub fn songs_root(&self) -> &Path {
        &self.songs_root
    }

    pub fn emotion_dir(&self, emotion: Emotion) -> PathBuf {
        self.songs_root.join(emotion.label())
    }

    /// First regular, non-hidden file of the emotion's directory, by file name.
    pub fn song_list_path(&self, emotion: Emotion) -> Result<PathBuf, PlaylistError> {
        let dir = self.emotion_dir(emotion);
        if !dir.is_dir() {
            return Err(PlaylistError::DirectoryNotFound(dir));
        }

        let mut candidates = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !hidden && entry.file_type()?.is_file() {
                candidates.push(entry.path());
            }
        }
        candidates.sort();

        candidates
            .into_iter()
            .next()
            .ok_or(PlaylistError::NoSongList(dir))
    }

    /// Loads the song list for `emotion`, without the identifier column.
    pub fn fetch_song_list(&self, emotion: Emotion) -> Result<Table, PlaylistError> {
        let path = self.song_list_path(emotion)?;
        debug!("Loading {} song list from {:?}", emotion, path);

        let mut table = read_sheet(&path)?;
        table
            .drop_column(ID_COLUMN)
            .map_err(|source| PlaylistError::Table { path, source })?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;
    use tempfile::TempDir;

    fn library_with(files: &[(&str, &str, &str)]) -> (TempDir, PlaylistLibrary) {
        let dir = TempDir::new().unwrap();
        for (emotion, name, content) in files {
            let emotion_dir = dir.path().join(emotion);
            fs::create_dir_all(&emotion_dir).unwrap();
            fs::write(emotion_dir.join(name), content).unwrap();
        }
        let library = PlaylistLibrary::new(dir.path());
        (dir, library)
    }

    #[test]
    fn fetches_list_without_id_column() {
        let (_dir, library) = library_with(&[(
            "Happy",
            "happy_songs.csv",
            "ID,Song,Artist\n1,Happy,Pharrell Williams\n2,Shake It Off,Taylor Swift\n",
        )]);

        let table = library.fetch_song_list(Emotion::Happy).unwrap();

        assert_eq!(table.columns(), &["Song".to_string(), "Artist".to_string()]);
        assert!(table.column_index(ID_COLUMN).is_none());
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1][0], CellValue::Text("Shake It Off".into()));
    }

    #[test]
    fn uses_first_file_by_name() {
        let (_dir, library) = library_with(&[
            ("Sad", "b_list.csv", "ID,Song\n1,Second\n"),
            ("Sad", "a_list.csv", "ID,Song\n1,First\n"),
        ]);

        let path = library.song_list_path(Emotion::Sad).unwrap();
        assert!(path.ends_with("a_list.csv"));

        let table = library.fetch_song_list(Emotion::Sad).unwrap();
        assert_eq!(table.rows()[0][0], CellValue::Text("First".into()));
    }

    #[test]
    fn skips_hidden_files_and_directories() {
        let (dir, library) = library_with(&[
            ("Neutral", ".DS_Store", "junk"),
            ("Neutral", "z_songs.csv", "ID,Song\n1,Clocks\n"),
        ]);
        fs::create_dir_all(dir.path().join("Neutral").join("archive")).unwrap();

        let path = library.song_list_path(Emotion::Neutral).unwrap();
        assert!(path.ends_with("z_songs.csv"));
    }

    #[test]
    fn missing_directory() {
        let (_dir, library) = library_with(&[]);
        let err = library.fetch_song_list(Emotion::Angry).unwrap_err();
        assert!(matches!(err, PlaylistError::DirectoryNotFound(_)));
    }

    #[test]
    fn empty_directory() {
        let (dir, library) = library_with(&[]);
        fs::create_dir_all(dir.path().join("Angry")).unwrap();

        let err = library.fetch_song_list(Emotion::Angry).unwrap_err();
        assert!(matches!(err, PlaylistError::NoSongList(_)));
    }

    #[test]
    fn list_without_id_column_fails() {
        let (_dir, library) =
            library_with(&[("Angry", "angry.csv", "Song,Artist\nBreak Stuff,Limp Bizkit\n")]);

        let err = library.fetch_song_list(Emotion::Angry).unwrap_err();
        assert!(matches!(
            err,
            PlaylistError::Table {
                source: TableError::MissingColumn(_),
                ..
            }
        ));
    }

    #[test]
    fn unsupported_first_file() {
        let (_dir, library) = library_with(&[("Happy", "README.md", "# songs")]);
        let err = library.fetch_song_list(Emotion::Happy).unwrap_err();
        assert!(matches!(err, PlaylistError::UnsupportedFormat(_)));
    }
}
