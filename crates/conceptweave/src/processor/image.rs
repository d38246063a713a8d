use crate::error::ExtractionError;
use crate::processor::ocr::OcrEngine;
use crate::processor::{DocumentFormat, TextExtractor};

pub struct ImageExtractor {
    ocr: OcrEngine,
}

impl ImageExtractor {
    pub fn new(ocr: OcrEngine) -> Self {
        Self { ocr }
    }
}

impl TextExtractor for ImageExtractor {
    fn extract(&self, bytes: &[u8], _file_name: &str) -> Result<String, ExtractionError> {
        let _span = tracing::info_span!("processor.image", bytes = bytes.len()).entered();

        let format = image::guess_format(bytes)
            .map_err(|e| ExtractionError::Ocr(format!("Unrecognized image data: {}", e)))?;
        tracing::debug!(?format, "Running OCR on image");

        self.ocr.recognize(bytes)
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Image)
    }
}
