//! Speech-to-text binding over whisper.cpp.

use std::path::Path;

use tracing::debug;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::{resample, PcmAudio, TARGET_SAMPLE_RATE};
use crate::error::{Error, Result};

/// Whisper transcriber holding a loaded ggml model.
pub struct WhisperTranscriber {
    context: WhisperContext,
    num_threads: usize,
}

impl WhisperTranscriber {
    pub fn load(model_path: &Path, num_threads: usize) -> Result<Self> {
        let path = model_path
            .to_str()
            .ok_or_else(|| Error::ModelLoad("whisper model path is not UTF-8".to_string()))?;
        let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| Error::ModelLoad(format!("failed to load whisper model: {e}")))?;
        Ok(Self {
            context,
            num_threads,
        })
    }

    /// Transcribe decoded PCM audio; greedy sampling, no timestamps.
    pub fn transcribe(&self, audio: &PcmAudio, language: Option<&str>) -> Result<String> {
        let audio = resample(audio, TARGET_SAMPLE_RATE);
        if audio.samples.is_empty() {
            return Err(Error::Validation("audio contains no samples".to_string()));
        }

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(language.unwrap_or("auto")));
        params.set_n_threads(self.num_threads as i32);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        let mut state = self
            .context
            .create_state()
            .map_err(|e| Error::Inference(format!("failed to create whisper state: {e}")))?;
        state
            .full(params, &audio.samples)
            .map_err(|e| Error::Inference(format!("transcription failed: {e}")))?;

        let segments = state
            .full_n_segments()
            .map_err(|e| Error::Inference(format!("failed to read segments: {e}")))?;

        let mut text = String::new();
        for i in 0..segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| Error::Inference(format!("failed to read segment {i}: {e}")))?;
            text.push_str(&segment);
        }

        let text = text.trim().to_string();
        debug!(segments, chars = text.len(), "transcription done");
        Ok(text)
    }
}
