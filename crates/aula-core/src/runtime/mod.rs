//! Runtime service: the engine and its per-modality handlers.

mod audio;
mod document;
mod image;
mod service;
mod text;
mod types;

pub use service::Engine;
pub use types::{AudioReport, GeneratedImage, ImageReport, TextAnswer};

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use std::sync::Arc;

    use crate::config::EngineConfig;
    use crate::error::Result;
    use crate::llm::TextGenerator;
    use crate::runtime::Engine;
    use crate::vision::ocr::OcrEngine;

    /// LLM mock that echoes the prompt it was handed.
    pub struct EchoLlm;

    #[async_trait]
    impl TextGenerator for EchoLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            Ok(format!("echo:{prompt}"))
        }

        async fn probe(&self) -> Result<()> {
            Ok(())
        }
    }

    /// OCR mock returning a fixed string.
    pub struct FixedOcr {
        text: String,
    }

    impl FixedOcr {
        pub fn new(text: &str) -> Self {
            Self {
                text: text.to_string(),
            }
        }

        pub fn empty() -> Self {
            Self::new("")
        }
    }

    #[async_trait]
    impl OcrEngine for FixedOcr {
        async fn recognize(&self, _image: &::image::DynamicImage) -> Result<String> {
            Ok(self.text.clone())
        }
    }

    /// Engine wired to mocks, with a throwaway models dir.
    pub fn engine_with_mocks(
        llm: Arc<dyn TextGenerator>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Engine {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = EngineConfig {
            models_dir: dir.keep(),
            ..EngineConfig::default()
        };
        Engine::with_backends(config, llm, ocr).expect("engine")
    }
}
