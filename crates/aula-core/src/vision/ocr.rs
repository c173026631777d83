//! Optical character recognition via the tesseract executable.

use async_trait::async_trait;
use image::DynamicImage;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// OCR seam. The production engine shells out to tesseract; tests mock this.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Extract text from an image. Whitespace is preserved as emitted.
    async fn recognize(&self, image: &DynamicImage) -> Result<String>;
}

/// Binding to the `tesseract` command-line engine.
///
/// The image is written to a temporary PNG because tesseract reads from a
/// path; the file is removed when the handle drops.
pub struct TesseractOcr {
    languages: String,
}

impl TesseractOcr {
    pub fn new(languages: impl Into<String>) -> Self {
        Self {
            languages: languages.into(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &DynamicImage) -> Result<String> {
        let file = {
            let image = image.clone();
            tokio::task::spawn_blocking(move || -> Result<tempfile::NamedTempFile> {
                let file = tempfile::Builder::new()
                    .prefix("aula-ocr-")
                    .suffix(".png")
                    .tempfile()?;
                image
                    .save_with_format(file.path(), image::ImageFormat::Png)
                    .map_err(|e| Error::Inference(format!("failed to stage OCR input: {e}")))?;
                Ok(file)
            })
            .await
            .map_err(|e| Error::Inference(format!("OCR staging task failed: {e}")))??
        };

        let output = Command::new("tesseract")
            .arg(file.path())
            .arg("stdout")
            .args(["-l", &self.languages])
            .output()
            .await
            .map_err(|e| Error::UpstreamModel(format!("failed to run tesseract: {e}")))?;

        if !output.status.success() {
            return Err(Error::UpstreamModel(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(chars = text.len(), "OCR complete");
        Ok(text)
    }
}
