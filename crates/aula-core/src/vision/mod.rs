//! Image understanding: OCR, zero-shot classification, object detection.

pub mod clip;
pub mod diffusion;
pub mod ocr;
pub mod yolo;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One zero-shot classification candidate with its probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub score: f32,
}

/// One detected object with confidence and `[x1, y1, x2, y2]` pixel box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub object: String,
    pub confidence: f32,
    pub position: [f32; 4],
}

/// Decode and verify an uploaded image.
///
/// Failure is the caller's fault (not an image) and maps to HTTP 400.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes)
        .map_err(|e| Error::Validation(format!("file is not a valid image: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_image_bytes() {
        let err = decode_image(b"not an image").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn decodes_generated_png() {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.width(), 4);
    }
}
