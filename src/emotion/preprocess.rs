//! Captured image → model input tensor.

use image::imageops::{self, FilterType};
use ndarray::Array4;

use super::ClassifierError;

/// Side of the square grayscale image the model was trained on.
pub const INPUT_SIZE: usize = 48;

/// `[batch, height, width, channels]`
pub const INPUT_SHAPE: [usize; 4] = [1, INPUT_SIZE, INPUT_SIZE, 1];

// ITU-R 601 luma weights
const RED_WEIGHT: f32 = 0.2989;
const GREEN_WEIGHT: f32 = 0.5870;
const BLUE_WEIGHT: f32 = 0.1140;

/// Decodes an encoded image (PNG, JPEG, ...) and turns it into a
/// `(1, 48, 48, 1)` grayscale tensor with values in `[0, 255]`.
///
/// The image is resized with nearest-neighbour sampling before the grayscale
/// conversion; no normalization is applied.
pub fn preprocess(image_bytes: &[u8]) -> Result<Array4<f32>, ClassifierError> {
    let decoded = image::load_from_memory(image_bytes)
        .map_err(|e| ClassifierError::InvalidImage(e.to_string()))?;
    let rgb = decoded.to_rgb8();
    let resized = imageops::resize(
        &rgb,
        INPUT_SIZE as u32,
        INPUT_SIZE as u32,
        FilterType::Nearest,
    );

    let mut tensor = Array4::<f32>::zeros(INPUT_SHAPE);
    for (x, y, pixel) in resized.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        tensor[[0, y as usize, x as usize, 0]] =
            RED_WEIGHT * r as f32 + GREEN_WEIGHT * g as f32 + BLUE_WEIGHT * b as f32;
    }
    Ok(tensor)
}
