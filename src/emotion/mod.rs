//! Emotion classification from a captured face image.

mod classifier;
mod onnx_model;
mod preprocess;

pub use classifier::{Classifier, ClassifierError, EmotionModel};
pub use onnx_model::OnnxEmotionModel;
pub use preprocess::{preprocess, INPUT_SHAPE, INPUT_SIZE};

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The four classes produced by the model, in output-index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Emotion {
    Angry,
    Happy,
    Neutral,
    Sad,
}

impl Emotion {
    pub const ALL: [Emotion; 4] = [
        Emotion::Angry,
        Emotion::Happy,
        Emotion::Neutral,
        Emotion::Sad,
    ];

    /// Maps a model output index to its class.
    pub fn from_index(index: usize) -> Option<Emotion> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Display name, also the name of the emotion's song-list directory.
    pub fn label(self) -> &'static str {
        match self {
            Emotion::Angry => "Angry",
            Emotion::Happy => "Happy",
            Emotion::Neutral => "Neutral",
            Emotion::Sad => "Sad",
        }
    }

    /// Color the mood line is rendered with, `None` for the default text color.
    pub fn color(self) -> Option<&'static str> {
        match self {
            Emotion::Angry | Emotion::Sad => Some("red"),
            Emotion::Happy => Some("green"),
            Emotion::Neutral => None,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownEmotion(pub String);

impl fmt::Display for UnknownEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown emotion: {}", self.0)
    }
}

impl std::error::Error for UnknownEmotion {}

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownEmotion(s.to_string()))
    }
}
