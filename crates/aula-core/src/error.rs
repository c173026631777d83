//! Engine error types.

use thiserror::Error;

/// Closed error taxonomy for the engine.
///
/// `Validation` marks expected bad input and maps to HTTP 400 at the API
/// layer; every other variant is an internal failure and maps to HTTP 500
/// with a generic message. Details stay in the server logs.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing caller input.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A wrapped model or external service failed.
    #[error("upstream model error: {0}")]
    UpstreamModel(String),

    /// A model artifact could not be fetched or loaded.
    #[error("model load error: {0}")]
    ModelLoad(String),

    /// Inference ran but produced a failure.
    #[error("inference error: {0}")]
    Inference(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors the caller can fix by changing the request.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_flagged() {
        assert!(Error::Validation("bad".into()).is_validation());
        assert!(!Error::UpstreamModel("down".into()).is_validation());
    }
}
