use thiserror::Error;

/// Rejection raised by the local input guard before any network call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("message text is empty")]
    EmptyText,

    #[error("image payload is empty")]
    EmptyImage,

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
}

/// Malformed gateway response.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("response is not valid JSON for the analysis schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("simulation has no steps")]
    NoSteps,

    #[error("empty identifier at {0}")]
    EmptyId(String),

    #[error("duplicate step id {0:?}")]
    DuplicateStep(String),

    #[error("duplicate field id {field:?} in step {step:?}")]
    DuplicateField { step: String, field: String },
}

impl DecodeError {
    pub fn empty_id(path: impl Into<String>) -> Self {
        DecodeError::EmptyId(path.into())
    }
}
