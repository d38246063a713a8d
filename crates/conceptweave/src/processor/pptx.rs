use std::io::{Cursor, Read};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ExtractionError;
use crate::processor::{DocumentFormat, TextExtractor};

static RE_SLIDE_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub struct PptxExtractor;

impl PptxExtractor {
    pub fn new() -> Self {
        Self
    }
}

/// Visible text of one slide part: tags dropped, entities decoded,
/// whitespace collapsed.
fn slide_text(xml: &str) -> String {
    let stripped = RE_TAG.replace_all(xml, " ");
    let decoded = match quick_xml::escape::unescape(&stripped) {
        Ok(text) => text.into_owned(),
        Err(_) => stripped.into_owned(),
    };
    RE_WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

fn slide_index(part_name: &str) -> Option<u32> {
    RE_SLIDE_PART
        .captures(part_name)?
        .get(1)?
        .as_str()
        .parse::<u32>()
        .ok()
}

impl Default for PptxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for PptxExtractor {
    fn extract(&self, bytes: &[u8], _file_name: &str) -> Result<String, ExtractionError> {
        let _span = tracing::info_span!("processor.pptx", bytes = bytes.len()).entered();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractionError::Pptx(format!("Failed to open PPTX: {}", e)))?;

        // Sorted by the slide's own number, not lexically (slide10 after slide9).
        let mut slides: Vec<(u32, String)> = archive
            .file_names()
            .filter_map(|name| slide_index(name).map(|index| (index, name.to_string())))
            .collect();
        slides.sort_by_key(|(index, _)| *index);

        let mut paragraphs = Vec::new();
        for (index, name) in slides {
            let mut part = archive
                .by_name(&name)
                .map_err(|e| ExtractionError::Pptx(format!("Failed to open {}: {}", name, e)))?;

            let mut xml = String::new();
            part.read_to_string(&mut xml)
                .map_err(|e| ExtractionError::Pptx(format!("Failed to read {}: {}", name, e)))?;

            let text = slide_text(&xml);
            if !text.is_empty() {
                paragraphs.push(format!("Slide {}: {}", index, text));
            }
        }

        Ok(paragraphs.join("\n\n"))
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Pptx)
    }
}
