//! Multimodal dispatch endpoint.

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use aula_core::{ImageBackend, Modality};

use crate::error::ApiError;
use crate::state::AppState;

/// Parsed `POST /process` form.
#[derive(Debug, Default)]
struct ProcessForm {
    modality: Option<String>,
    prompt: String,
    file: Option<Vec<u8>>,
    language: Option<String>,
}

/// Handle a multimodal processing request.
pub async fn process(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = parse_form(multipart).await?;

    let modality: Modality = form
        .modality
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("missing 'modality' field"))?
        .parse()
        .map_err(ApiError::from)?;

    info!(
        %modality,
        prompt_len = form.prompt.len(),
        file_len = form.file.as_ref().map(|f| f.len()).unwrap_or(0),
        "process request"
    );

    // One permit per request: inference blocks for its full duration.
    let _permit = state.acquire_permit().await;

    match modality {
        Modality::Text => {
            let answer = state.engine.answer_text(&form.prompt).await?;
            Ok(Json(answer).into_response())
        }
        Modality::Pdf => {
            let file = require_file(modality, form.file)?;
            let answer = state.engine.analyze_document(file).await?;
            Ok(Json(answer).into_response())
        }
        Modality::Image => match state.engine.config().image_backend {
            ImageBackend::Analysis => {
                let file = require_file(modality, form.file)?;
                let report = state.engine.analyze_image(&file, &form.prompt).await?;
                Ok(Json(report).into_response())
            }
            ImageBackend::Generation => {
                let generated = state.engine.generate_image(&form.prompt).await?;
                Response::builder()
                    .header(header::CONTENT_TYPE, "image/jpeg")
                    .body(Body::from(generated.jpeg))
                    .map_err(|e| ApiError::internal(format!("failed to build response: {e}")))
            }
        },
        Modality::Audio => {
            let file = require_file(modality, form.file)?;
            let report = state
                .engine
                .analyze_audio(&file, form.language.as_deref())
                .await?;
            Ok(Json(report).into_response())
        }
    }
}

/// Collect the multipart fields; unknown fields are ignored.
async fn parse_form(mut multipart: Multipart) -> Result<ProcessForm, ApiError> {
    let mut form = ProcessForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("failed reading multipart field: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "modality" => {
                let text = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("failed reading 'modality' field: {e}"))
                })?;
                let value = text.trim();
                if !value.is_empty() {
                    form.modality = Some(value.to_string());
                }
            }
            "prompt" => {
                form.prompt = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("failed reading 'prompt' field: {e}"))
                })?;
            }
            "file" => {
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::bad_request(format!("failed reading 'file' field: {e}"))
                })?;
                if !bytes.is_empty() {
                    form.file = Some(bytes.to_vec());
                }
            }
            "language" => {
                let text = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("failed reading 'language' field: {e}"))
                })?;
                let value = text.trim();
                if !value.is_empty() {
                    form.language = Some(value.to_string());
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

fn require_file(modality: Modality, file: Option<Vec<u8>>) -> Result<Vec<u8>, ApiError> {
    file.ok_or_else(|| {
        ApiError::bad_request(format!(
            "modality '{modality}' requires an uploaded 'file' field"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn missing_file_is_a_bad_request() {
        let err = require_file(Modality::Pdf, None).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("pdf"));
    }

    #[test]
    fn present_file_passes_through() {
        let bytes = require_file(Modality::Audio, Some(vec![1, 2, 3])).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn image_report_wire_shape() {
        let report = aula_core::ImageReport::Document {
            description: "a syllabus".to_string(),
            text: "week 1: thermodynamics".to_string(),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["type"], "document");
        assert_eq!(value["description"], "a syllabus");
        assert_eq!(value["text"], "week 1: thermodynamics");
    }

    #[test]
    fn scene_report_wire_shape() {
        let report = aula_core::ImageReport::Scene {
            description: "a dog outdoors".to_string(),
            classification: vec![],
            detections: vec![],
            ocr_text: None,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["type"], "image");
        // Absent OCR text is omitted from the payload entirely.
        assert!(value.get("ocr_text").is_none());
    }
}
