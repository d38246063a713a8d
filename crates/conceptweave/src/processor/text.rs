use crate::error::ExtractionError;
use crate::processor::{DocumentFormat, TextExtractor};

pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8], _file_name: &str) -> Result<String, ExtractionError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Text)
    }
}
