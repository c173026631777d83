//! API error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<aula_core::Error> for ApiError {
    fn from(err: aula_core::Error) -> Self {
        match &err {
            // Expected validation failures carry their message to the caller.
            aula_core::Error::Validation(msg) => ApiError::bad_request(msg.clone()),
            // Everything else is logged in full and surfaced generically:
            // model failure detail stays out of client responses.
            aula_core::Error::UpstreamModel(_) | aula_core::Error::ModelLoad(_) => {
                error!("model backend failure: {err}");
                ApiError::internal("model backend failure")
            }
            aula_core::Error::Inference(_) | aula_core::Error::Io(_) => {
                error!("internal error: {err}");
                ApiError::internal("internal error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400_with_message() {
        let api: ApiError = aula_core::Error::Validation("missing file".into()).into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.message, "missing file");
    }

    #[test]
    fn model_failures_map_to_500_without_detail() {
        let api: ApiError =
            aula_core::Error::UpstreamModel("connection refused at 10.0.0.5".into()).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.message.contains("10.0.0.5"));
    }
}
