//! Image modality handlers: analysis and generation.

use tracing::warn;

use crate::error::{Error, Result};
use crate::modality::Modality;
use crate::prompt;
use crate::runtime::service::Engine;
use crate::runtime::types::{GeneratedImage, ImageReport};
use crate::vision::{self, Classification, Detection};

/// OCR text longer than this marks the image as a document and skips the
/// visual models entirely.
const DOCUMENT_TEXT_THRESHOLD: usize = 50;

/// OCR fallback text carried into the scene description prompt.
const OCR_SNIPPET_LIMIT: usize = 500;

impl Engine {
    /// Analyze an uploaded image: OCR first, visual models only when the
    /// image is not a text document.
    pub async fn analyze_image(&self, bytes: &[u8], user_prompt: &str) -> Result<ImageReport> {
        let image = vision::decode_image(bytes)?;

        // OCR runs first; a failure here is logged and the image falls
        // through to visual analysis.
        let ocr_text = match self.ocr.recognize(&image).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("OCR failed: {e}");
                None
            }
        };

        if let Some(text) = &ocr_text {
            if text.trim().chars().count() > DOCUMENT_TEXT_THRESHOLD {
                // Document short-circuit: first OCR success wins, the
                // classifier and detector are never invoked.
                let generation_prompt = format!(
                    "Analyze this text extracted from an image:\n{text}\nContext: {user_prompt}"
                );
                let description = self.llm.generate(&generation_prompt).await?;
                return Ok(ImageReport::Document {
                    description,
                    text: text.clone(),
                });
            }
        }

        let classifier = self.registry.classifier().await?;
        let detector = self.registry.detector().await?;

        let (classification, detections) = tokio::task::spawn_blocking(move || {
            let classification = classifier.classify(&image)?;
            let detections = detector.detect(&image)?;
            Ok::<_, Error>((classification, detections))
        })
        .await
        .map_err(|e| Error::Inference(format!("visual analysis task failed: {e}")))??;

        let snippet = ocr_text
            .as_deref()
            .map(|t| t.chars().take(OCR_SNIPPET_LIMIT).collect::<String>());

        let analysis_prompt =
            scene_prompt(&classification, &detections, snippet.as_deref(), user_prompt);
        let enhanced =
            prompt::enhance(&analysis_prompt, Modality::Image, self.config.prompt_profile);
        let description = self.llm.generate(&enhanced).await?;

        Ok(ImageReport::Scene {
            description,
            classification,
            detections,
            ocr_text: snippet,
        })
    }

    /// Generate an image from a text prompt with the diffusion pipeline.
    pub async fn generate_image(&self, user_prompt: &str) -> Result<GeneratedImage> {
        if user_prompt.trim().is_empty() {
            return Err(Error::Validation(
                "image generation requires a prompt".to_string(),
            ));
        }

        let pipeline = self.registry.diffusion().await?;
        let prompt = user_prompt.to_string();
        let jpeg = tokio::task::spawn_blocking(move || pipeline.generate(&prompt))
            .await
            .map_err(|e| Error::Inference(format!("image generation task failed: {e}")))??;

        Ok(GeneratedImage { jpeg })
    }
}

/// Assemble the description prompt from the visual analysis.
fn scene_prompt(
    classification: &[Classification],
    detections: &[Detection],
    ocr_snippet: Option<&str>,
    user_prompt: &str,
) -> String {
    let labels = classification
        .iter()
        .map(|c| format!("{} ({:.1}%)", c.label, c.score * 100.0))
        .collect::<Vec<_>>()
        .join(", ");

    let objects = if detections.is_empty() {
        "none".to_string()
    } else {
        detections
            .iter()
            .map(|d| {
                format!(
                    "{} ({:.2}) at [{:.0}, {:.0}, {:.0}, {:.0}]",
                    d.object,
                    d.confidence,
                    d.position[0],
                    d.position[1],
                    d.position[2],
                    d.position[3]
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    };

    let ocr_line = match ocr_snippet {
        Some(text) if !text.trim().is_empty() => text,
        _ => "No significant text found",
    };

    format!(
        "Describe this image based on the analysis:\n\
         Classification: {labels}\n\
         Detected objects: {objects}\n\
         OCR text (if any): {ocr_line}\n\
         Additional context: {user_prompt}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::test_support::{engine_with_mocks, EchoLlm, FixedOcr};
    use std::sync::Arc;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([200, 10, 10]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn long_ocr_text_short_circuits_visual_models() {
        // No classifier or detector artifacts exist in the test models dir,
        // so reaching the visual path would fail loudly. A document report
        // proves the short-circuit.
        let long_text = "lecture notes ".repeat(10);
        let engine = engine_with_mocks(Arc::new(EchoLlm), Arc::new(FixedOcr::new(&long_text)));

        let report = engine.analyze_image(&png_bytes(), "context").await.unwrap();
        match report {
            ImageReport::Document { text, description } => {
                assert_eq!(text, long_text);
                assert!(description.contains("Analyze this text extracted from an image"));
            }
            ImageReport::Scene { .. } => panic!("expected the document short-circuit"),
        }
    }

    #[tokio::test]
    async fn invalid_image_is_a_validation_error() {
        let engine = engine_with_mocks(Arc::new(EchoLlm), Arc::new(FixedOcr::empty()));
        let err = engine.analyze_image(b"not an image", "").await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn empty_generation_prompt_is_rejected() {
        let engine = engine_with_mocks(Arc::new(EchoLlm), Arc::new(FixedOcr::empty()));
        let err = engine.generate_image("  ").await.unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn scene_prompt_mentions_every_section() {
        let classification = vec![Classification {
            label: "nature".to_string(),
            score: 0.75,
        }];
        let detections = vec![Detection {
            object: "dog".to_string(),
            confidence: 0.9,
            position: [1.0, 2.0, 3.0, 4.0],
        }];
        let prompt = scene_prompt(&classification, &detections, None, "my context");
        assert!(prompt.contains("nature (75.0%)"));
        assert!(prompt.contains("dog (0.90)"));
        assert!(prompt.contains("No significant text found"));
        assert!(prompt.ends_with("my context"));
    }
}
