//! Zero-shot image classification with a CLIP ONNX export.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Mutex;

use image::DynamicImage;
use ndarray::{Array2, Array4};
use ort::logging::LogLevel;
use ort::session::{Session, SessionInputs};
use ort::value::TensorRef;
use tokenizers::Tokenizer;
use tracing::debug;

use crate::error::{Error, Result};
use crate::vision::Classification;

/// Candidate labels mirrored from the source deployment.
pub const CANDIDATE_LABELS: [&str; 7] = [
    "document", "text", "nature", "person", "object", "screen", "photo",
];

const INPUT_SIZE: u32 = 224;
const CONTEXT_LENGTH: usize = 77;
const MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
const STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// CLIP session plus the pre-tokenized candidate label batch.
pub struct ClipClassifier {
    session: Mutex<Session>,
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
}

impl ClipClassifier {
    /// Load the ONNX model and tokenize the fixed label set once.
    pub fn load(model_path: &Path, tokenizer_path: &Path) -> Result<Self> {
        let session = Session::builder()
            .and_then(|b| b.with_log_level(LogLevel::Error))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| Error::ModelLoad(format!("failed to load classifier: {e}")))?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| Error::ModelLoad(format!("failed to load CLIP tokenizer: {e}")))?;

        let (input_ids, attention_mask) = tokenize_labels(&tokenizer)?;

        Ok(Self {
            session: Mutex::new(session),
            input_ids,
            attention_mask,
        })
    }

    /// Classify against the fixed label set, scores sorted descending.
    pub fn classify(&self, image: &DynamicImage) -> Result<Vec<Classification>> {
        let pixels = preprocess(image);

        let pixel_dims: Vec<i64> = pixels.shape().iter().map(|&d| d as i64).collect();
        let ids_dims: Vec<i64> = self.input_ids.shape().iter().map(|&d| d as i64).collect();
        let mask_dims: Vec<i64> = self
            .attention_mask
            .shape()
            .iter()
            .map(|&d| d as i64)
            .collect();

        let pixel_data = pixels.as_slice().ok_or_else(|| {
            Error::Inference("pixel tensor is not contiguous".to_string())
        })?;
        let ids_data = self.input_ids.as_slice().ok_or_else(|| {
            Error::Inference("input_ids tensor is not contiguous".to_string())
        })?;
        let mask_data = self.attention_mask.as_slice().ok_or_else(|| {
            Error::Inference("attention_mask tensor is not contiguous".to_string())
        })?;

        let pixel_ref = TensorRef::from_array_view((pixel_dims, pixel_data))
            .map_err(|e| Error::Inference(format!("bad pixel tensor: {e}")))?;
        let ids_ref = TensorRef::from_array_view((ids_dims, ids_data))
            .map_err(|e| Error::Inference(format!("bad input_ids tensor: {e}")))?;
        let mask_ref = TensorRef::from_array_view((mask_dims, mask_data))
            .map_err(|e| Error::Inference(format!("bad attention_mask tensor: {e}")))?;

        let inputs: SessionInputs<'_, '_, 0> = SessionInputs::ValueMap(vec![
            (Cow::Borrowed("input_ids"), ids_ref.into()),
            (Cow::Borrowed("pixel_values"), pixel_ref.into()),
            (Cow::Borrowed("attention_mask"), mask_ref.into()),
        ]);

        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::Inference("classifier session lock poisoned".to_string()))?;
        let outputs = session
            .run(inputs)
            .map_err(|e| Error::Inference(format!("classifier forward pass failed: {e}")))?;

        let (_, logits) = outputs["logits_per_image"]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference(format!("bad classifier output: {e}")))?;

        let scores = softmax(logits);
        let mut ranked: Vec<Classification> = CANDIDATE_LABELS
            .iter()
            .zip(scores)
            .map(|(label, score)| Classification {
                label: (*label).to_string(),
                score,
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        if let Some(top) = ranked.first() {
            debug!(top = %top.label, score = top.score, "classification done");
        }
        Ok(ranked)
    }
}

/// Tokenize `"a photo of {label}"` for every candidate, padded to the CLIP
/// context length.
fn tokenize_labels(tokenizer: &Tokenizer) -> Result<(Array2<i64>, Array2<i64>)> {
    let pad_id = tokenizer
        .get_vocab(true)
        .get("<|endoftext|>")
        .copied()
        .ok_or_else(|| Error::ModelLoad("CLIP tokenizer has no end-of-text token".to_string()))?
        as i64;

    let mut input_ids = Array2::<i64>::from_elem((CANDIDATE_LABELS.len(), CONTEXT_LENGTH), pad_id);
    let mut attention_mask = Array2::<i64>::zeros((CANDIDATE_LABELS.len(), CONTEXT_LENGTH));

    for (row, label) in CANDIDATE_LABELS.iter().enumerate() {
        let encoding = tokenizer
            .encode(format!("a photo of {label}"), true)
            .map_err(|e| Error::ModelLoad(format!("failed to tokenize label '{label}': {e}")))?;
        for (col, &id) in encoding.get_ids().iter().take(CONTEXT_LENGTH).enumerate() {
            input_ids[[row, col]] = id as i64;
            attention_mask[[row, col]] = 1;
        }
    }

    Ok((input_ids, attention_mask))
}

/// Resize to 224x224 and normalize with the CLIP mean/std, NCHW layout.
fn preprocess(image: &DynamicImage) -> Array4<f32> {
    let resized = image
        .resize_exact(INPUT_SIZE, INPUT_SIZE, image::imageops::FilterType::CatmullRom)
        .to_rgb8();

    let mut pixels = Array4::<f32>::zeros((1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for channel in 0..3 {
            pixels[[0, channel, y as usize, x as usize]] =
                (pixel.0[channel] as f32 / 255.0 - MEAN[channel]) / STD[channel];
        }
    }
    pixels
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one() {
        let scores = softmax(&[1.0, 2.0, 3.0]);
        let total: f32 = scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(scores[2] > scores[1] && scores[1] > scores[0]);
    }

    #[test]
    fn preprocess_shape_and_range() {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            64,
            48,
            image::Rgb([128, 128, 128]),
        ));
        let pixels = preprocess(&img);
        assert_eq!(pixels.shape(), &[1, 3, 224, 224]);
        // A mid-gray pixel lands near zero after normalization.
        assert!(pixels[[0, 0, 0, 0]].abs() < 1.0);
    }
}
