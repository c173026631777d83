//! Catalog of the pre-trained model artifacts each binding needs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Heavyweight model kinds cached for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Zero-shot image classifier (CLIP ONNX export).
    Classifier,
    /// Object detector (YOLOv8n ONNX export).
    Detector,
    /// Text-to-image diffusion pipeline (Stable Diffusion v1.5).
    Diffusion,
    /// Speech-to-text model (whisper.cpp ggml).
    Transcriber,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::Classifier => "classifier",
            ModelKind::Detector => "detector",
            ModelKind::Diffusion => "diffusion",
            ModelKind::Transcriber => "transcriber",
        };
        f.write_str(name)
    }
}

/// A single downloadable file belonging to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Artifact {
    pub repo: &'static str,
    pub filename: &'static str,
}

pub const CLIP_MODEL: Artifact = Artifact {
    repo: "Xenova/clip-vit-base-patch32",
    filename: "onnx/model.onnx",
};

pub const CLIP_TOKENIZER: Artifact = Artifact {
    repo: "Xenova/clip-vit-base-patch32",
    filename: "tokenizer.json",
};

pub const YOLO_MODEL: Artifact = Artifact {
    repo: "Xenova/yolov8n",
    filename: "onnx/model.onnx",
};

pub const WHISPER_MODEL: Artifact = Artifact {
    repo: "ggerganov/whisper.cpp",
    filename: "ggml-base.bin",
};

pub const SD_TOKENIZER: Artifact = Artifact {
    repo: "openai/clip-vit-base-patch32",
    filename: "tokenizer.json",
};

pub const SD_CLIP: Artifact = Artifact {
    repo: "stable-diffusion-v1-5/stable-diffusion-v1-5",
    filename: "text_encoder/model.safetensors",
};

pub const SD_VAE: Artifact = Artifact {
    repo: "stable-diffusion-v1-5/stable-diffusion-v1-5",
    filename: "vae/diffusion_pytorch_model.safetensors",
};

pub const SD_UNET: Artifact = Artifact {
    repo: "stable-diffusion-v1-5/stable-diffusion-v1-5",
    filename: "unet/diffusion_pytorch_model.safetensors",
};

impl ModelKind {
    /// Every artifact the kind needs on disk before it can load.
    pub fn artifacts(&self) -> &'static [Artifact] {
        match self {
            ModelKind::Classifier => &[CLIP_MODEL, CLIP_TOKENIZER],
            ModelKind::Detector => &[YOLO_MODEL],
            ModelKind::Diffusion => &[SD_TOKENIZER, SD_CLIP, SD_VAE, SD_UNET],
            ModelKind::Transcriber => &[WHISPER_MODEL],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_artifacts() {
        for kind in [
            ModelKind::Classifier,
            ModelKind::Detector,
            ModelKind::Diffusion,
            ModelKind::Transcriber,
        ] {
            assert!(!kind.artifacts().is_empty(), "{kind} has no artifacts");
        }
    }
}
