//! Process-lifetime model cache.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::audio::whisper::WhisperTranscriber;
use crate::catalog::ModelKind;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::fetch::ModelFetcher;
use crate::vision::clip::ClipClassifier;
use crate::vision::diffusion::SdPipeline;
use crate::vision::yolo::YoloDetector;

/// Lazily instantiates heavyweight models on first use and keeps them
/// resident for the lifetime of the process.
///
/// One guarded cell per model kind: concurrent first requests coalesce on
/// the cell instead of racing duplicate loads. There is no eviction and no
/// sizing; whatever loads stays loaded until the process exits.
pub struct ModelRegistry {
    config: EngineConfig,
    fetcher: Arc<ModelFetcher>,
    classifier: OnceCell<Arc<ClipClassifier>>,
    detector: OnceCell<Arc<YoloDetector>>,
    diffusion: OnceCell<Arc<SdPipeline>>,
    transcriber: OnceCell<Arc<WhisperTranscriber>>,
}

impl ModelRegistry {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let fetcher = Arc::new(ModelFetcher::new(config.models_dir.clone())?);
        Ok(Self {
            config,
            fetcher,
            classifier: OnceCell::new(),
            detector: OnceCell::new(),
            diffusion: OnceCell::new(),
            transcriber: OnceCell::new(),
        })
    }

    /// Which kinds are currently resident.
    pub fn loaded_kinds(&self) -> Vec<ModelKind> {
        let mut kinds = Vec::new();
        if self.classifier.get().is_some() {
            kinds.push(ModelKind::Classifier);
        }
        if self.detector.get().is_some() {
            kinds.push(ModelKind::Detector);
        }
        if self.diffusion.get().is_some() {
            kinds.push(ModelKind::Diffusion);
        }
        if self.transcriber.get().is_some() {
            kinds.push(ModelKind::Transcriber);
        }
        kinds
    }

    pub async fn classifier(&self) -> Result<Arc<ClipClassifier>> {
        let fetcher = self.fetcher.clone();
        let model = self
            .classifier
            .get_or_try_init(|| async move {
                info!("loading {}", ModelKind::Classifier);
                tokio::task::spawn_blocking(move || {
                    let paths = fetcher.ensure_all(ModelKind::Classifier.artifacts())?;
                    ClipClassifier::load(&paths[0], &paths[1]).map(Arc::new)
                })
                .await
                .map_err(|e| Error::ModelLoad(format!("classifier load task failed: {e}")))?
            })
            .await?;
        Ok(model.clone())
    }

    pub async fn detector(&self) -> Result<Arc<YoloDetector>> {
        let fetcher = self.fetcher.clone();
        let model = self
            .detector
            .get_or_try_init(|| async move {
                info!("loading {}", ModelKind::Detector);
                tokio::task::spawn_blocking(move || {
                    let paths = fetcher.ensure_all(ModelKind::Detector.artifacts())?;
                    YoloDetector::load(&paths[0]).map(Arc::new)
                })
                .await
                .map_err(|e| Error::ModelLoad(format!("detector load task failed: {e}")))?
            })
            .await?;
        Ok(model.clone())
    }

    pub async fn diffusion(&self) -> Result<Arc<SdPipeline>> {
        let fetcher = self.fetcher.clone();
        let steps = self.config.diffusion_steps;
        let model = self
            .diffusion
            .get_or_try_init(|| async move {
                info!("loading {}", ModelKind::Diffusion);
                tokio::task::spawn_blocking(move || {
                    let paths = fetcher.ensure_all(ModelKind::Diffusion.artifacts())?;
                    SdPipeline::load(&paths[0], &paths[1], &paths[2], &paths[3], steps)
                        .map(Arc::new)
                })
                .await
                .map_err(|e| Error::ModelLoad(format!("diffusion load task failed: {e}")))?
            })
            .await?;
        Ok(model.clone())
    }

    pub async fn transcriber(&self) -> Result<Arc<WhisperTranscriber>> {
        let fetcher = self.fetcher.clone();
        let num_threads = self.config.num_threads;
        let model = self
            .transcriber
            .get_or_try_init(|| async move {
                info!("loading {}", ModelKind::Transcriber);
                tokio::task::spawn_blocking(move || {
                    let paths = fetcher.ensure_all(ModelKind::Transcriber.artifacts())?;
                    WhisperTranscriber::load(&paths[0], num_threads).map(Arc::new)
                })
                .await
                .map_err(|e| Error::ModelLoad(format!("transcriber load task failed: {e}")))?
            })
            .await?;
        Ok(model.clone())
    }
}
