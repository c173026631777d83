//! Model artifact fetching from the Hugging Face Hub.

use hf_hub::api::sync::{Api, ApiBuilder};
use std::path::PathBuf;
use tracing::info;

use crate::catalog::Artifact;
use crate::error::{Error, Result};

/// Downloads model files on demand into the configured cache directory.
///
/// Already-cached files resolve without touching the network. The sync hub
/// API is used from `spawn_blocking`, mirroring how the rest of the engine
/// pushes blocking work off the async path.
pub struct ModelFetcher {
    api: Api,
}

impl ModelFetcher {
    pub fn new(models_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&models_dir)?;
        let api = ApiBuilder::new()
            .with_cache_dir(models_dir)
            .build()
            .map_err(|e| Error::ModelLoad(format!("failed to initialize hub client: {e}")))?;
        Ok(Self { api })
    }

    /// Resolve a single artifact to a local path, downloading if needed.
    pub fn ensure(&self, artifact: Artifact) -> Result<PathBuf> {
        let repo = self.api.model(artifact.repo.to_string());
        let path = repo.get(artifact.filename).map_err(|e| {
            Error::ModelLoad(format!(
                "failed to fetch {}/{}: {e}",
                artifact.repo, artifact.filename
            ))
        })?;
        info!(repo = artifact.repo, file = artifact.filename, "artifact ready");
        Ok(path)
    }

    /// Resolve a set of artifacts in order.
    pub fn ensure_all(&self, artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
        artifacts.iter().map(|a| self.ensure(*a)).collect()
    }
}
