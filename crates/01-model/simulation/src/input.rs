use crate::error::InputError;
use std::sync::Arc;

/// Raw material submitted for analysis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnalysisInput {
    /// Pasted message text, already trimmed.
    Text(String),
    /// Uploaded screenshot.
    Image {
        bytes: Arc<[u8]>,
        media_type: String,
    },
}

impl AnalysisInput {
    /// Accepts pasted text, rejecting blank submissions before any call is made.
    pub fn text(text: impl AsRef<str>) -> Result<Self, InputError> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            return Err(InputError::EmptyText);
        }
        Ok(AnalysisInput::Text(trimmed.to_owned()))
    }

    /// Accepts an uploaded image. Only `image/*` media types are forwarded.
    pub fn image(bytes: impl Into<Arc<[u8]>>, media_type: impl Into<String>) -> Result<Self, InputError> {
        let bytes = bytes.into();
        let media_type = media_type.into();
        if bytes.is_empty() {
            return Err(InputError::EmptyImage);
        }
        if !media_type.starts_with("image/") {
            return Err(InputError::UnsupportedMediaType(media_type));
        }
        Ok(AnalysisInput::Image { bytes, media_type })
    }

    pub fn is_image(&self) -> bool {
        matches!(self, AnalysisInput::Image { .. })
    }
}
