use std::io::Cursor;
use std::sync::Arc;

use crate::error::ExtractionError;

/// Tesseract OCR over in-memory images.
///
/// Each call creates its own Tesseract handle; handles are not shared across
/// threads.
#[derive(Clone)]
pub struct OcrEngine {
    inner: Arc<OcrEngineInner>,
}

struct OcrEngineInner {
    language: String,
}

impl OcrEngine {
    pub fn new(language: &str) -> Self {
        let language = if language.trim().is_empty() {
            "eng".to_string()
        } else {
            language.trim().to_string()
        };

        Self {
            inner: Arc::new(OcrEngineInner { language }),
        }
    }

    pub fn language(&self) -> &str {
        &self.inner.language
    }

    pub fn recognize(&self, image_data: &[u8]) -> Result<String, ExtractionError> {
        let _span = tracing::info_span!("processor.ocr", language = %self.inner.language).entered();

        // Normalize every supported input (JPEG, WEBP, ...) to PNG for leptonica.
        let img = image::load_from_memory(image_data)
            .map_err(|e| ExtractionError::Ocr(format!("Failed to load image: {}", e)))?;

        let mut png_data = Vec::new();
        img.write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
            .map_err(|e| ExtractionError::Ocr(format!("Failed to convert image: {}", e)))?;

        let mut lt = leptess::LepTess::new(None, &self.inner.language).map_err(|e| {
            ExtractionError::Ocr(format!("Failed to initialize Tesseract: {}", e))
        })?;

        lt.set_image_from_mem(&png_data)
            .map_err(|e| ExtractionError::Ocr(format!("Failed to set image for OCR: {}", e)))?;

        lt.get_utf8_text()
            .map_err(|e| ExtractionError::Ocr(format!("OCR failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ocr_engine_language() {
        assert_eq!(OcrEngine::new("deu").language(), "deu");
        assert_eq!(OcrEngine::new("  ").language(), "eng");
    }

    #[test]
    fn test_invalid_image_data_error() {
        let engine = OcrEngine::new("eng");
        let result = engine.recognize(b"not valid image data");

        match result {
            Err(ExtractionError::Ocr(msg)) => {
                assert!(msg.contains("Failed to load image"));
            }
            _ => panic!("Expected Ocr error for invalid image data"),
        }
    }

    #[test]
    fn test_clone_shares_settings() {
        let engine = OcrEngine::new("fra");
        let cloned = engine.clone();
        assert!(Arc::ptr_eq(&engine.inner, &cloned.inner));
    }
}
