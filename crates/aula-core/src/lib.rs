//! Aula Core - multimodal study-assistant engine
//!
//! Routes a user payload (text prompt, PDF, image, or audio) through a short
//! modality-specific pipeline backed by pre-trained models, and returns a
//! typed result for the HTTP layer to serialize.
//!
//! Heavy models are loaded lazily on first use and cached for the lifetime
//! of the process; text generation is delegated to a local
//! Ollama-compatible service.

pub mod audio;
pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod llm;
pub mod modality;
pub mod prompt;
pub mod registry;
pub mod runtime;
pub mod vision;

pub use config::{EngineConfig, ImageBackend};
pub use error::{Error, Result};
pub use modality::Modality;
pub use prompt::PromptProfile;
pub use runtime::{AudioReport, Engine, GeneratedImage, ImageReport, TextAnswer};
