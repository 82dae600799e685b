use ndarray::{Array4, ArrayView4};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::preprocess::{preprocess, INPUT_SHAPE};
use super::Emotion;

/// Errors that can occur while turning an image into an emotion.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid input shape {actual:?}, expected {expected:?}")]
    InvalidShape {
        expected: [usize; 4],
        actual: Vec<usize>,
    },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Model produced {0} scores, expected 4")]
    UnexpectedOutput(usize),
}

/// A pre-trained model scoring a `(1, 48, 48, 1)` grayscale tensor against
/// the four emotion classes.
pub trait EmotionModel: Send + Sync {
    /// Returns one score per class, in class-index order.
    fn predict(&self, input: ArrayView4<'_, f32>) -> Result<Vec<f32>, ClassifierError>;
}

/// Index of the highest score. The first maximum wins; NaN never does.
fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

#[derive(Clone)]
pub struct Classifier {
    model: Arc<dyn EmotionModel>,
}

impl Classifier {
    pub fn new(model: Arc<dyn EmotionModel>) -> Self {
        Self { model }
    }

    /// Classifies a preprocessed tensor.
    pub fn classify(&self, tensor: &Array4<f32>) -> Result<Emotion, ClassifierError> {
        if tensor.shape() != INPUT_SHAPE {
            return Err(ClassifierError::InvalidShape {
                expected: INPUT_SHAPE,
                actual: tensor.shape().to_vec(),
            });
        }

        let scores = self.model.predict(tensor.view())?;
        if scores.len() != Emotion::ALL.len() {
            return Err(ClassifierError::UnexpectedOutput(scores.len()));
        }
        debug!("Emotion scores: {:?}", scores);

        argmax(&scores)
            .and_then(Emotion::from_index)
            .ok_or_else(|| ClassifierError::Inference("All scores are NaN".to_string()))
    }

    /// Decodes, preprocesses and classifies an encoded image.
    pub fn classify_image(&self, image_bytes: &[u8]) -> Result<Emotion, ClassifierError> {
        let tensor = preprocess(image_bytes)?;
        self.classify(&tensor)
    }
}
