//! Audio decode and preprocessing for the speech-to-text pipeline.

pub mod whisper;

use crate::error::{Error, Result};

/// Sample rate the transcriber expects.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Decoded mono PCM ready for transcription.
#[derive(Debug, Clone)]
pub struct PcmAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl PcmAudio {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Decode an uploaded WAV payload into mono f32 samples.
///
/// Integer formats are scaled to [-1, 1]; multi-channel audio is mixed down
/// by averaging. Undecodable uploads are the caller's fault.
pub fn decode_wav(bytes: &[u8]) -> Result<PcmAudio> {
    let cursor = std::io::Cursor::new(bytes);
    let mut reader = hound::WavReader::new(cursor)
        .map_err(|e| Error::Validation(format!("file is not a readable WAV: {e}")))?;

    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample.max(1) as u32;
            let max_val = if bits > 1 {
                ((1i64 << (bits - 1)) - 1) as f32
            } else {
                1.0
            };
            reader
                .samples::<i32>()
                .filter_map(|s| s.ok())
                .map(|s| (s as f32 / max_val).clamp(-1.0, 1.0))
                .collect()
        }
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .filter_map(|s| s.ok())
            .map(|s| if s.is_finite() { s.clamp(-1.0, 1.0) } else { 0.0 })
            .collect(),
    };

    let mono = if channels > 1 {
        mix_down(&samples, channels)
    } else {
        samples
    };

    Ok(PcmAudio {
        samples: mono,
        sample_rate: spec.sample_rate,
    })
}

/// Average interleaved channels into mono.
fn mix_down(samples: &[f32], channels: usize) -> Vec<f32> {
    let mut mono = Vec::with_capacity(samples.len() / channels + 1);
    for frame in samples.chunks(channels) {
        let sum: f32 = frame.iter().copied().sum();
        mono.push(sum / frame.len() as f32);
    }
    mono
}

/// Linear resample to the transcriber's 16 kHz input rate.
pub fn resample(audio: &PcmAudio, target_rate: u32) -> PcmAudio {
    if audio.sample_rate == target_rate || audio.samples.is_empty() || audio.sample_rate == 0 {
        return PcmAudio {
            samples: audio.samples.clone(),
            sample_rate: if audio.sample_rate == 0 {
                target_rate
            } else {
                audio.sample_rate
            },
        };
    }

    let ratio = audio.sample_rate as f64 / target_rate as f64;
    let out_len = ((audio.samples.len() as f64) / ratio).floor() as usize;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let src = i as f64 * ratio;
        let left = src.floor() as usize;
        let right = (left + 1).min(audio.samples.len() - 1);
        let frac = (src - left as f64) as f32;
        out.push(audio.samples[left] * (1.0 - frac) + audio.samples[right] * frac);
    }

    PcmAudio {
        samples: out,
        sample_rate: target_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(spec: hound::WavSpec, samples: &[i16]) -> Vec<u8> {
        let mut bytes = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut bytes, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        bytes.into_inner()
    }

    #[test]
    fn decodes_mono_int16() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let audio = decode_wav(&wav_bytes(spec, &[0, i16::MAX, i16::MIN])).unwrap();
        assert_eq!(audio.sample_rate, 16_000);
        assert_eq!(audio.samples.len(), 3);
        assert!((audio.samples[1] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn stereo_is_mixed_down() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        // One frame: left fully positive, right zero.
        let audio = decode_wav(&wav_bytes(spec, &[i16::MAX, 0])).unwrap();
        assert_eq!(audio.samples.len(), 1);
        assert!((audio.samples[0] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn resample_halves_length() {
        let audio = PcmAudio {
            samples: vec![0.0; 32_000],
            sample_rate: 32_000,
        };
        let resampled = resample(&audio, TARGET_SAMPLE_RATE);
        assert_eq!(resampled.sample_rate, TARGET_SAMPLE_RATE);
        assert_eq!(resampled.samples.len(), 16_000);
    }

    #[test]
    fn resample_is_identity_at_target_rate() {
        let audio = PcmAudio {
            samples: vec![0.25; 100],
            sample_rate: TARGET_SAMPLE_RATE,
        };
        let resampled = resample(&audio, TARGET_SAMPLE_RATE);
        assert_eq!(resampled.samples, audio.samples);
    }

    #[test]
    fn garbage_is_a_validation_error() {
        assert!(decode_wav(b"not audio").unwrap_err().is_validation());
    }
}
