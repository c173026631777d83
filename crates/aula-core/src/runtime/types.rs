//! Typed handler results.

use serde::{Deserialize, Serialize};

use crate::vision::{Classification, Detection};

/// Result of the text and PDF pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextAnswer {
    pub result: String,
}

/// Result of the image analysis pipeline.
///
/// `Document` is the OCR short-circuit: significant text was found, so the
/// visual models never ran. `Scene` carries the full visual analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ImageReport {
    Document {
        description: String,
        text: String,
    },
    #[serde(rename = "image")]
    Scene {
        description: String,
        classification: Vec<Classification>,
        detections: Vec<Detection>,
        #[serde(skip_serializing_if = "Option::is_none")]
        ocr_text: Option<String>,
    },
}

/// Result of the image generation pipeline.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub jpeg: Vec<u8>,
}

/// Result of the audio pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioReport {
    pub transcription: String,
    pub result: String,
}
