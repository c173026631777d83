//! PDF modality handler.

use crate::document::extract_pdf_text;
use crate::error::{Error, Result};
use crate::modality::Modality;
use crate::prompt;
use crate::runtime::service::Engine;
use crate::runtime::types::TextAnswer;

impl Engine {
    /// Extract per-page text from a PDF upload and summarize it.
    ///
    /// Pages without extractable text are skipped; an all-empty document
    /// still produces a (bare-template) generation request.
    pub async fn analyze_document(&self, pdf_bytes: Vec<u8>) -> Result<TextAnswer> {
        let text = tokio::task::spawn_blocking(move || extract_pdf_text(&pdf_bytes))
            .await
            .map_err(|e| Error::Inference(format!("PDF extraction task failed: {e}")))??;

        let prompt = prompt::enhance(&text, Modality::Pdf, self.config.prompt_profile);
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
    async fn corrupt_pdf_is_a_validation_error() {
        let engine = engine_with_mocks(Arc::new(EchoLlm), Arc::new(FixedOcr::empty()));
        let err = engine
            .analyze_document(b"not a pdf".to_vec())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn all_empty_pdf_yields_bare_template_prompt() {
        let engine = engine_with_mocks(Arc::new(EchoLlm), Arc::new(FixedOcr::empty()));
        let bytes = crate::document::pdf_with_pages(&[None, None]);
        let answer = engine.analyze_document(bytes).await.unwrap();

        let bare_template = prompt::enhance("", Modality::Pdf, PromptProfile::Standard);
        assert_eq!(answer.result, format!("echo:{bare_template}"));
    }
}
