//! Audio modality handler.

use crate::audio;
use crate::error::{Error, Result};
use crate::modality::Modality;
use crate::prompt;
use crate::runtime::service::Engine;
use crate::runtime::types::AudioReport;

impl Engine {
    /// Transcribe an audio upload and analyze the transcription.
    ///
    /// Returns both the raw transcription and the generated analysis.
    pub async fn analyze_audio(
        &self,
        bytes: &[u8],
        language: Option<&str>,
    ) -> Result<AudioReport> {
        let pcm = audio::decode_wav(bytes)?;

        let transcriber = self.registry.transcriber().await?;
        let transcription = tokio::task::spawn_blocking({
            let language = language.map(|s| s.to_string());
            move || transcriber.transcribe(&pcm, language.as_deref())
        })
        .await
        .map_err(|e| Error::Inference(format!("transcription task failed: {e}")))??;

        let prompt = prompt::enhance(&transcription, Modality::Audio, self.config.prompt_profile);
        let result = self.llm.generate(&prompt).await?;

        Ok(AudioReport {
            transcription,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::test_support::{engine_with_mocks, EchoLlm, FixedOcr};
    use std::sync::Arc;

    #[tokio::test]
    async fn undecodable_audio_is_a_validation_error() {
        let engine = engine_with_mocks(Arc::new(EchoLlm), Arc::new(FixedOcr::empty()));
        let err = engine
            .analyze_audio(b"not audio at all", None)
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
