//! Request payload handed to the model transport.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use simulation::AnalysisInput;

const IMAGE_INSTRUCTION: &str = "Analyze and create the interactive sandbox.";

/// Inline binary part, base64 encoded for the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub data: String,
    pub mime_type: String,
}

/// One content part of a model request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    InlineData(InlineData),
}

/// Content sent to the analysis model for one call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelRequest {
    pub parts: Vec<Part>,
}

impl ModelRequest {
    /// Builds the request for a guarded input.
    pub fn for_input(input: &AnalysisInput) -> Self {
        let parts = match input {
            AnalysisInput::Text(text) => vec![Part::Text(format!("Analyze: \"{text}\""))],
            AnalysisInput::Image { bytes, media_type } => vec![
                Part::InlineData(InlineData {
                    data: STANDARD.encode(bytes),
                    mime_type: media_type.clone(),
                }),
                Part::Text(IMAGE_INSTRUCTION.to_owned()),
            ],
        };
        Self { parts }
    }
}
