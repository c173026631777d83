//! Text modality handler.

use crate::error::Result;
use crate::modality::Modality;
use crate::prompt;
use crate::runtime::service::Engine;
use crate::runtime::types::TextAnswer;

impl Engine {
    /// Forward a free-text prompt to the text-generation service behind the
    /// fixed academic template.
    pub async fn answer_text(&self, user_prompt: &str) -> Result<TextAnswer> {
        let prompt = prompt::enhance(user_prompt, Modality::Text, self.config.prompt_profile);
        let result = self.llm.generate(&prompt).await?;
        Ok(TextAnswer { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::PromptProfile;
    use crate::runtime::test_support::{engine_with_mocks, EchoLlm, FixedOcr};
    use std::sync::Arc;

    #[tokio::test]
    async fn result_is_generated_from_template_plus_prompt() {
        let engine = engine_with_mocks(Arc::new(EchoLlm), Arc::new(FixedOcr::empty()));
        let answer = engine.answer_text("what is osmosis?").await.unwrap();

        let expected_prompt = prompt::enhance(
            "what is osmosis?",
            Modality::Text,
            PromptProfile::Standard,
        );
        assert_eq!(answer.result, format!("echo:{expected_prompt}"));
    }
}
