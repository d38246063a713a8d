pub mod docx;
pub mod fallback;
pub mod image;
pub mod ocr;
pub mod pdf;
pub mod pptx;
pub mod text;

use serde::{Deserialize, Serialize};

use crate::config::ExtractionConfig;
use crate::error::ExtractionError;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_PPT: &str = "application/vnd.ms-powerpoint";
pub const MIME_PPTX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_PNG: &str = "image/png";
pub const MIME_WEBP: &str = "image/webp";

/// MIME types accepted at submission.
pub const ALLOWED_MIME_TYPES: [&str; 9] = [
    MIME_PDF, MIME_PPT, MIME_PPTX, MIME_DOC, MIME_DOCX, MIME_TEXT, MIME_JPEG, MIME_PNG, MIME_WEBP,
];

const GENERIC_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Pptx,
    Docx,
    Image,
    Text,
    /// Anything without a dedicated extractor, including legacy `.doc`/`.ppt`.
    Other,
}

impl DocumentFormat {
    pub fn from_mime(mime: &str) -> Self {
        match normalize_mime(mime).as_str() {
            MIME_PDF => DocumentFormat::Pdf,
            MIME_PPTX => DocumentFormat::Pptx,
            MIME_DOCX => DocumentFormat::Docx,
            MIME_TEXT => DocumentFormat::Text,
            MIME_JPEG | "image/jpg" | MIME_PNG | MIME_WEBP => DocumentFormat::Image,
            _ => DocumentFormat::Other,
        }
    }

    /// Picks the extraction strategy for an upload.
    ///
    /// The declared MIME type wins; a missing or generic one falls back to
    /// guessing from the file name's extension.
    pub fn detect(declared_mime: Option<&str>, file_name: &str) -> Self {
        match declared_mime.map(normalize_mime) {
            Some(mime) if !mime.is_empty() && mime != GENERIC_MIME => Self::from_mime(&mime),
            _ => mime_guess::from_path(file_name)
                .first()
                .map(|guess| Self::from_mime(guess.essence_str()))
                .unwrap_or(DocumentFormat::Other),
        }
    }
}

/// Lowercases a MIME type and drops parameters such as `; charset=utf-8`.
pub fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub format: DocumentFormat,
}

pub trait TextExtractor: Send + Sync {
    /// Returns the raw text of a document. `file_name` is only used by
    /// extractors that describe rather than read the content.
    fn extract(&self, bytes: &[u8], file_name: &str) -> Result<String, ExtractionError>;
    fn supports(&self, format: DocumentFormat) -> bool;
}

pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn TextExtractor>>,
    fallback: fallback::FallbackExtractor,
    min_text_length: usize,
}

impl ExtractorRegistry {
    pub fn new(config: &ExtractionConfig) -> Self {
        let ocr = ocr::OcrEngine::new(&config.ocr_language);
        let extractors: Vec<Box<dyn TextExtractor>> = vec![
            Box::new(text::PlainTextExtractor::new()),
            Box::new(pdf::PdfExtractor::new()),
            Box::new(pptx::PptxExtractor::new()),
            Box::new(docx::DocxExtractor::new()),
            Box::new(image::ImageExtractor::new(ocr)),
        ];

        Self {
            extractors,
            fallback: fallback::FallbackExtractor::new(),
            min_text_length: config.min_text_length,
        }
    }

    pub fn min_text_length(&self) -> usize {
        self.min_text_length
    }

    /// Extracts text with the extractor for `format` and applies the
    /// minimum-length guard to the trimmed result.
    pub fn extract(
        &self,
        bytes: &[u8],
        format: DocumentFormat,
        file_name: &str,
    ) -> Result<ExtractedText, ExtractionError> {
        let extractor: &dyn TextExtractor = self
            .extractors
            .iter()
            .find(|e| e.supports(format))
            .map(|e| e.as_ref())
            .unwrap_or(&self.fallback);

        let raw = extractor.extract(bytes, file_name)?;
        let text = raw.trim();

        let found = text.chars().count();
        if found < self.min_text_length {
            return Err(ExtractionError::InsufficientContent {
                found,
                minimum: self.min_text_length,
            });
        }

        tracing::debug!(?format, chars = found, "Extracted text");

        Ok(ExtractedText {
            text: text.to_string(),
            format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ExtractorRegistry {
        ExtractorRegistry::new(&ExtractionConfig::default())
    }

    #[test]
    fn test_detect_prefers_declared_mime() {
        assert_eq!(
            DocumentFormat::detect(Some(MIME_PDF), "notes.docx"),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::detect(Some("Text/Plain; charset=utf-8"), "notes"),
            DocumentFormat::Text
        );
    }

    #[test]
    fn test_detect_falls_back_to_extension() {
        assert_eq!(
            DocumentFormat::detect(None, "deck.pptx"),
            DocumentFormat::Pptx
        );
        assert_eq!(
            DocumentFormat::detect(Some(GENERIC_MIME), "scan.png"),
            DocumentFormat::Image
        );
        assert_eq!(DocumentFormat::detect(None, "blob"), DocumentFormat::Other);
    }

    #[test]
    fn test_legacy_office_types_use_fallback() {
        assert_eq!(DocumentFormat::from_mime(MIME_DOC), DocumentFormat::Other);
        assert_eq!(DocumentFormat::from_mime(MIME_PPT), DocumentFormat::Other);
    }

    #[test]
    fn test_registry_routes_text_format() {
        let extracted = registry()
            .extract(
                b"Photosynthesis converts light energy into chemical energy.",
                DocumentFormat::Text,
                "bio.txt",
            )
            .unwrap();

        assert!(extracted.text.starts_with("Photosynthesis"));
        assert_eq!(extracted.format, DocumentFormat::Text);
    }

    #[test]
    fn test_guard_counts_trimmed_characters() {
        let result = registry().extract(b"   too short      \n\n", DocumentFormat::Text, "a.txt");

        match result {
            Err(ExtractionError::InsufficientContent { found, minimum }) => {
                assert_eq!(found, 9);
                assert_eq!(minimum, 20);
            }
            other => panic!("Expected InsufficientContent, got {:?}", other),
        }
    }

    #[test]
    fn test_guard_counts_unicode_scalars() {
        // 20 two-byte characters pass; byte length would be 40.
        let text = "é".repeat(20);
        assert!(registry()
            .extract(text.as_bytes(), DocumentFormat::Text, "a.txt")
            .is_ok());

        let text = "é".repeat(19);
        assert!(registry()
            .extract(text.as_bytes(), DocumentFormat::Text, "a.txt")
            .is_err());
    }

    #[test]
    fn test_other_format_uses_placeholder() {
        let extracted = registry()
            .extract(b"\xd0\xcf\x11\xe0", DocumentFormat::Other, "legacy.doc")
            .unwrap();

        assert!(extracted.text.contains("\".doc\""));
        assert_eq!(extracted.format, DocumentFormat::Other);
    }

    #[test]
    fn test_zero_minimum_accepts_empty_text() {
        let config = ExtractionConfig {
            min_text_length: 0,
            ..ExtractionConfig::default()
        };
        let extracted = ExtractorRegistry::new(&config)
            .extract(b"", DocumentFormat::Text, "empty.txt")
            .unwrap();
        assert!(extracted.text.is_empty());
    }
}
