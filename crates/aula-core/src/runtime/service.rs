//! Engine: the runtime service behind every modality handler.

use std::sync::Arc;

use tracing::info;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::llm::{OllamaClient, TextGenerator};
use crate::registry::ModelRegistry;
use crate::vision::ocr::{OcrEngine, TesseractOcr};

/// Owns the model registry and the external-service seams.
///
/// One instance per process, shared behind `Arc` by the HTTP layer.
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) registry: ModelRegistry,
    pub(crate) llm: Arc<dyn TextGenerator>,
    pub(crate) ocr: Arc<dyn OcrEngine>,
}

impl Engine {
    /// Create an engine with the production backends.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let llm = Arc::new(OllamaClient::new(
            config.ollama_url.clone(),
            config.text_model.clone(),
        )?);
        let ocr = Arc::new(TesseractOcr::new(config.ocr_languages.clone()));
        Self::with_backends(config, llm, ocr)
    }

    /// Create an engine with caller-supplied seams (used by tests).
    pub fn with_backends(
        config: EngineConfig,
        llm: Arc<dyn TextGenerator>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Result<Self> {
        let registry = ModelRegistry::new(config.clone())?;
        info!(
            image_backend = ?config.image_backend,
            text_model = %config.text_model,
            "engine ready"
        );
        Ok(Self {
            config,
            registry,
            llm,
            ocr,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Reachability probe for the text-generation service.
    pub async fn probe_text_service(&self) -> Result<()> {
        self.llm.probe().await
    }
}
