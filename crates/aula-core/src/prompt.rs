//! Prompt templating.
//!
//! Every modality forwards user input to the text-generation service behind a
//! fixed instructional prefix. The `detailed` profile carries the longer
//! structuring instructions used by one of the source deployments.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;
use crate::modality::Modality;

/// Template profile selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PromptProfile {
    #[default]
    Standard,
    Detailed,
}

impl FromStr for PromptProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "detailed" => Ok(Self::Detailed),
            other => Err(Error::Validation(format!(
                "unknown prompt profile '{other}' (expected 'standard' or 'detailed')"
            ))),
        }
    }
}

const TEXT_PREFIX: &str = "[ACADEMIC CONTEXT] Answer clearly and objectively, citing references where possible. Limit the answer to 400 words.\nQuestion: ";
const PDF_PREFIX: &str = "[DOCUMENT ANALYSIS] Summarize the text below into its main topics, highlighting key concepts:\n";
const IMAGE_PREFIX: &str = "[IMAGE ANALYSIS] Describe and analyze the content of this image, identifying the relevant elements:\n";
const AUDIO_PREFIX: &str = "[TRANSCRIPTION] Convert the audio into text, identifying the main topics:\n";

const TEXT_PREFIX_DETAILED: &str = "[ACADEMIC CONTEXT] Answer clearly and objectively, citing references where possible. Structure the answer as: (1) direct answer, (2) supporting explanation, (3) suggested further reading. Limit the answer to 400 words.\nQuestion: ";
const PDF_PREFIX_DETAILED: &str = "[DOCUMENT ANALYSIS] Summarize the text below into its main topics, highlighting key concepts. For each topic give a one-sentence summary and list the terms a student should know:\n";
const IMAGE_PREFIX_DETAILED: &str = "[IMAGE ANALYSIS] Describe and analyze the content of this image, identifying the relevant elements. Cover the setting, the subjects, any visible text, and what the image is likely used for:\n";
const AUDIO_PREFIX_DETAILED: &str = "[TRANSCRIPTION] Convert the audio into text, identifying the main topics. Finish with a bullet list of the key points raised:\n";

/// Prefix for the given modality and profile.
pub fn template(modality: Modality, profile: PromptProfile) -> &'static str {
    match (profile, modality) {
        (PromptProfile::Standard, Modality::Text) => TEXT_PREFIX,
        (PromptProfile::Standard, Modality::Pdf) => PDF_PREFIX,
        (PromptProfile::Standard, Modality::Image) => IMAGE_PREFIX,
        (PromptProfile::Standard, Modality::Audio) => AUDIO_PREFIX,
        (PromptProfile::Detailed, Modality::Text) => TEXT_PREFIX_DETAILED,
        (PromptProfile::Detailed, Modality::Pdf) => PDF_PREFIX_DETAILED,
        (PromptProfile::Detailed, Modality::Image) => IMAGE_PREFIX_DETAILED,
        (PromptProfile::Detailed, Modality::Audio) => AUDIO_PREFIX_DETAILED,
    }
}

/// Concatenate the instructional prefix with the user's input.
pub fn enhance(input: &str, modality: Modality, profile: PromptProfile) -> String {
    let mut prompt = String::with_capacity(template(modality, profile).len() + input.len());
    prompt.push_str(template(modality, profile));
    prompt.push_str(input);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enhance_is_prefix_plus_input() {
        let prompt = enhance("what is entropy?", Modality::Text, PromptProfile::Standard);
        assert_eq!(
            prompt,
            format!("{TEXT_PREFIX}what is entropy?")
        );
    }

    #[test]
    fn empty_input_yields_bare_template() {
        let prompt = enhance("", Modality::Pdf, PromptProfile::Standard);
        assert_eq!(prompt, PDF_PREFIX);
    }

    #[test]
    fn detailed_profile_extends_standard_intent() {
        for modality in Modality::ALL {
            let standard = template(modality, PromptProfile::Standard);
            let detailed = template(modality, PromptProfile::Detailed);
            assert_ne!(standard, detailed);
            // Both profiles keep the same bracket tag.
            let tag_end = standard.find(']').unwrap();
            assert_eq!(&standard[..=tag_end], &detailed[..=tag_end]);
        }
    }

    #[test]
    fn profile_parses_wire_names() {
        assert_eq!(
            "detailed".parse::<PromptProfile>().unwrap(),
            PromptProfile::Detailed
        );
        assert!("verbose".parse::<PromptProfile>().is_err());
    }
}
