//! Text-to-image generation with Stable Diffusion v1.5 on candle.

use std::path::Path;

use candle_core::{DType, Device, IndexOp, Tensor};
use candle_transformers::models::stable_diffusion::{
    self, clip::ClipTextTransformer, unet_2d::UNet2DConditionModel, vae::AutoEncoderKL,
    StableDiffusionConfig,
};
use image::RgbImage;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::error::{Error, Result};

const HEIGHT: usize = 512;
const WIDTH: usize = 512;
const GUIDANCE_SCALE: f64 = 7.5;
// VAE latent scaling factor from the SD v1.x release.
const LATENT_SCALE: f64 = 0.18215;

/// Instructional prefix applied to generation prompts.
pub fn augment_prompt(prompt: &str) -> String {
    format!("High quality, detailed illustration: {prompt}")
}

/// Stable Diffusion text-to-image pipeline.
///
/// Holds the CLIP text encoder, UNet and VAE for the process lifetime; one
/// denoising run per call, no batching.
pub struct SdPipeline {
    tokenizer: Tokenizer,
    text_model: ClipTextTransformer,
    unet: UNet2DConditionModel,
    vae: AutoEncoderKL,
    scheduler_steps: usize,
    sd_config: StableDiffusionConfig,
    device: Device,
    dtype: DType,
}

impl SdPipeline {
    pub fn load(
        tokenizer_path: &Path,
        clip_path: &Path,
        vae_path: &Path,
        unet_path: &Path,
        scheduler_steps: usize,
    ) -> Result<Self> {
        let device = Device::cuda_if_available(0).unwrap_or(Device::Cpu);
        let dtype = DType::F32;
        let sd_config = StableDiffusionConfig::v1_5(None, Some(HEIGHT), Some(WIDTH));

        info!(?device, steps = scheduler_steps, "loading diffusion pipeline");

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| Error::ModelLoad(format!("failed to load diffusion tokenizer: {e}")))?;

        let text_model =
            stable_diffusion::build_clip_transformer(&sd_config.clip, clip_path, &device, dtype)
                .map_err(|e| Error::ModelLoad(format!("failed to load text encoder: {e}")))?;

        let vae = sd_config
            .build_vae(vae_path, &device, dtype)
            .map_err(|e| Error::ModelLoad(format!("failed to load VAE: {e}")))?;

        let unet = sd_config
            .build_unet(unet_path, &device, 4, false, dtype)
            .map_err(|e| Error::ModelLoad(format!("failed to load UNet: {e}")))?;

        Ok(Self {
            tokenizer,
            text_model,
            unet,
            vae,
            scheduler_steps,
            sd_config,
            device,
            dtype,
        })
    }

    /// Run the full txt2img pipeline and return the image as JPEG bytes.
    pub fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        let image = self
            .denoise(&augment_prompt(prompt))
            .map_err(|e| Error::Inference(format!("diffusion failed: {e}")))?;
        encode_jpeg(&image)
    }

    fn denoise(&self, prompt: &str) -> candle_core::Result<RgbImage> {
        let scheduler = self.sd_config.build_scheduler(self.scheduler_steps)?;

        let cond = self.encode_text(prompt)?;
        let uncond = self.encode_text("")?;
        let text_embeddings = Tensor::cat(&[uncond, cond], 0)?.to_dtype(self.dtype)?;

        let latents = Tensor::randn(
            0f32,
            1f32,
            (1, 4, HEIGHT / 8, WIDTH / 8),
            &self.device,
        )?;
        let mut latents = (latents * scheduler.init_noise_sigma())?;

        for (step, &timestep) in scheduler.timesteps().iter().enumerate() {
            let latent_model_input = Tensor::cat(&[&latents, &latents], 0)?;
            let latent_model_input = scheduler.scale_model_input(latent_model_input, timestep)?;
            let noise_pred =
                self.unet
                    .forward(&latent_model_input, timestep as f64, &text_embeddings)?;
            let noise_pred = noise_pred.chunk(2, 0)?;
            let (uncond_pred, cond_pred) = (&noise_pred[0], &noise_pred[1]);
            let noise_pred = (uncond_pred + ((cond_pred - uncond_pred)? * GUIDANCE_SCALE)?)?;
            latents = scheduler.step(&noise_pred, timestep, &latents)?;
            debug!(step, timestep, "denoising step done");
        }

        let image = self.vae.decode(&(&latents / LATENT_SCALE)?)?;
        let image = ((image / 2.0)? + 0.5)?.clamp(0f32, 1f32)?;
        let image = (image * 255.0)?
            .to_dtype(DType::U8)?
            .to_device(&Device::Cpu)?
            .i(0)?;

        let (_, height, width) = image.dims3()?;
        let pixels = image.permute((1, 2, 0))?.flatten_all()?.to_vec1::<u8>()?;
        RgbImage::from_raw(width as u32, height as u32, pixels).ok_or_else(|| {
            candle_core::Error::Msg("VAE output did not fill an RGB buffer".to_string())
        })
    }

    /// Tokenize and encode a prompt, padded to the CLIP context length.
    fn encode_text(&self, prompt: &str) -> candle_core::Result<Tensor> {
        let pad_id = match &self.sd_config.clip.pad_with {
            Some(padding) => self.tokenizer.get_vocab(true).get(padding.as_str()).copied(),
            None => self.tokenizer.get_vocab(true).get("<|endoftext|>").copied(),
        }
        .ok_or_else(|| candle_core::Error::Msg("tokenizer has no padding token".to_string()))?;

        let mut tokens = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| candle_core::Error::Msg(format!("tokenization failed: {e}")))?
            .get_ids()
            .to_vec();
        tokens.truncate(self.sd_config.clip.max_position_embeddings);
        while tokens.len() < self.sd_config.clip.max_position_embeddings {
            tokens.push(pad_id);
        }

        let tokens = Tensor::new(tokens.as_slice(), &self.device)?.unsqueeze(0)?;
        self.text_model.forward(&tokens)
    }
}

/// Encode an RGB image as JPEG bytes.
pub fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut bytes);
    image::DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut cursor, image::ImageFormat::Jpeg)
        .map_err(|e| Error::Inference(format!("JPEG encoding failed: {e}")))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn augmented_prompt_keeps_user_text() {
        let prompt = augment_prompt("a red bridge");
        assert!(prompt.starts_with("High quality"));
        assert!(prompt.ends_with("a red bridge"));
    }

    #[test]
    fn encoded_jpeg_is_decodable() {
        let image = RgbImage::from_fn(32, 32, |x, y| image::Rgb([x as u8, y as u8, 128]));
        let bytes = encode_jpeg(&image).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 32);
        assert_eq!(
            image::guess_format(&bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
    }
}
