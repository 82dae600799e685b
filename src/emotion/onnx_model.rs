//! ONNX Runtime backed emotion model.

use ndarray::ArrayView4;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use super::classifier::{ClassifierError, EmotionModel};

/// Pre-loaded ONNX session. `Session::run` needs `&mut`, so concurrent scans
/// take turns on the mutex.
pub struct OnnxEmotionModel {
    session: Mutex<Session>,
    input_name: String,
}

impl OnnxEmotionModel {
    /// Loads the model at `model_path`. `input_name` is the name of the
    /// graph's image input.
    pub fn load(model_path: &Path, input_name: &str) -> Result<Self, ClassifierError> {
        if !model_path.exists() {
            return Err(ClassifierError::ModelNotFound(format!("{:?}", model_path)));
        }

        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| ClassifierError::ModelLoad(e.to_string()))?;

        info!("Loaded emotion model from {:?}", model_path);

        Ok(Self {
            session: Mutex::new(session),
            input_name: input_name.to_string(),
        })
    }
}

impl EmotionModel for OnnxEmotionModel {
    fn predict(&self, input: ArrayView4<'_, f32>) -> Result<Vec<f32>, ClassifierError> {
        let input_tensor = Tensor::from_array(input.to_owned())
            .map_err(|e| ClassifierError::Inference(format!("Tensor creation error: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifierError::Inference("Model session poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let (_, first_value) = outputs
            .iter()
            .next()
            .ok_or_else(|| ClassifierError::Inference("Model produced no output".to_string()))?;

        let (_shape, scores) = first_value
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("Output extraction error: {}", e)))?;

        Ok(scores.to_vec())
    }
}
