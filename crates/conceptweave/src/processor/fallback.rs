use crate::error::ExtractionError;
use crate::processor::{DocumentFormat, TextExtractor};
use crate::sanitize::extension_of;

/// Describes a document it cannot read so the model can still produce a
/// generic academic-style summary.
pub struct FallbackExtractor;

impl FallbackExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FallbackExtractor {
    fn default() -> Self {
        Self::new()
    }
}

pub fn placeholder_text(file_name: &str) -> String {
    let ext = extension_of(file_name);
    let ext = if ext.is_empty() { "unknown" } else { &ext };
    format!(
        "This document is of type \"{}\". It likely contains educational or structured content. \
         Generate a clear academic-style summary and key concepts based on this context.",
        ext
    )
}

impl TextExtractor for FallbackExtractor {
    fn extract(&self, _bytes: &[u8], file_name: &str) -> Result<String, ExtractionError> {
        Ok(placeholder_text(file_name))
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Other)
    }
}
