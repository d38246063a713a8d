use crate::error::ExtractionError;
use crate::processor::{DocumentFormat, TextExtractor};

pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8], _file_name: &str) -> Result<String, ExtractionError> {
        let _span = tracing::info_span!("processor.pdf", bytes = bytes.len()).entered();

        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| ExtractionError::Pdf(format!("Failed to load PDF: {}", e)))?;

        Ok(extract_text_from_pdf(&doc))
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Pdf)
    }
}

/// Page text in page order, one newline per page. Pages whose content
/// streams cannot be decoded contribute nothing.
fn extract_text_from_pdf(doc: &lopdf::Document) -> String {
    let mut text = String::new();

    for (page_num, _) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => {
                text.push_str(page_text.trim_end());
                text.push('\n');
            }
            Err(e) => {
                tracing::debug!(page = page_num, error = %e, "Skipping undecodable PDF page");
            }
        }
    }

    text
}
