//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;
use crate::prompt::PromptProfile;

/// Which backend owns the `image` modality.
///
/// The source deployments diverge only here, so the choice is explicit
/// configuration rather than a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageBackend {
    /// OCR + zero-shot classification + object detection, described by the LLM.
    #[default]
    Analysis,
    /// Text-to-image diffusion, returning JPEG bytes.
    Generation,
}

impl FromStr for ImageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "analysis" => Ok(Self::Analysis),
            "generation" => Ok(Self::Generation),
            other => Err(Error::Validation(format!(
                "unknown image backend '{other}' (expected 'analysis' or 'generation')"
            ))),
        }
    }
}

/// Main engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory where model artifacts are cached.
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Base URL of the Ollama-compatible text-generation service.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Text-generation model name.
    #[serde(default = "default_text_model")]
    pub text_model: String,

    /// Backend bound to the `image` modality.
    #[serde(default)]
    pub image_backend: ImageBackend,

    /// Prompt template profile.
    #[serde(default)]
    pub prompt_profile: PromptProfile,

    /// Tesseract language packs, e.g. `por+eng`.
    #[serde(default = "default_ocr_languages")]
    pub ocr_languages: String,

    /// Denoising steps for the diffusion pipeline.
    #[serde(default = "default_diffusion_steps")]
    pub diffusion_steps: usize,

    /// Threads for CPU-bound model work.
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            ollama_url: default_ollama_url(),
            text_model: default_text_model(),
            image_backend: ImageBackend::default(),
            prompt_profile: PromptProfile::default(),
            ocr_languages: default_ocr_languages(),
            diffusion_steps: default_diffusion_steps(),
            num_threads: default_num_threads(),
        }
    }
}

impl EngineConfig {
    /// Default configuration with `AULA_*` environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = non_empty_env("AULA_MODELS_DIR") {
            config.models_dir = PathBuf::from(dir);
        }
        if let Some(url) = non_empty_env("AULA_OLLAMA_URL") {
            config.ollama_url = url;
        }
        if let Some(model) = non_empty_env("AULA_TEXT_MODEL") {
            config.text_model = model;
        }
        if let Some(backend) = non_empty_env("AULA_IMAGE_BACKEND") {
            match backend.parse() {
                Ok(parsed) => config.image_backend = parsed,
                Err(_) => tracing::warn!(
                    "Invalid AULA_IMAGE_BACKEND='{}', keeping '{:?}'",
                    backend,
                    config.image_backend
                ),
            }
        }
        if let Some(profile) = non_empty_env("AULA_PROMPT_PROFILE") {
            match profile.parse() {
                Ok(parsed) => config.prompt_profile = parsed,
                Err(_) => tracing::warn!(
                    "Invalid AULA_PROMPT_PROFILE='{}', keeping '{:?}'",
                    profile,
                    config.prompt_profile
                ),
            }
        }
        if let Some(langs) = non_empty_env("AULA_OCR_LANGUAGES") {
            config.ocr_languages = langs;
        }
        if let Some(steps) = non_empty_env("AULA_DIFFUSION_STEPS") {
            if let Ok(parsed) = steps.parse() {
                config.diffusion_steps = parsed;
            }
        }
        config
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_models_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aula")
        .join("models")
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_text_model() -> String {
    "llama3".to_string()
}

fn default_ocr_languages() -> String {
    "por+eng".to_string()
}

fn default_diffusion_steps() -> usize {
    30
}

fn default_num_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_backend_parses_wire_names() {
        assert_eq!(
            "analysis".parse::<ImageBackend>().unwrap(),
            ImageBackend::Analysis
        );
        assert_eq!(
            "GENERATION".parse::<ImageBackend>().unwrap(),
            ImageBackend::Generation
        );
        assert!("diffusion".parse::<ImageBackend>().is_err());
    }

    #[test]
    fn defaults_are_sane() {
        let config = EngineConfig::default();
        assert_eq!(config.text_model, "llama3");
        assert_eq!(config.image_backend, ImageBackend::Analysis);
        assert!(config.diffusion_steps > 0);
    }
}
