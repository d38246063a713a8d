use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ExtractionError;
use crate::processor::{DocumentFormat, TextExtractor};

pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for DocxExtractor {
    fn extract(&self, bytes: &[u8], _file_name: &str) -> Result<String, ExtractionError> {
        let _span = tracing::info_span!("processor.docx", bytes = bytes.len()).entered();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractionError::Docx(format!("Failed to open DOCX: {}", e)))?;

        let xml = read_document_xml(&mut archive)?;
        parse_docx_xml(&xml)
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Docx)
    }
}

fn read_document_xml<R: Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<String, ExtractionError> {
    let mut document_xml = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::Docx(format!("Failed to find document.xml: {}", e)))?;

    let mut xml_content = String::new();
    document_xml
        .read_to_string(&mut xml_content)
        .map_err(|e| ExtractionError::Docx(format!("Failed to read document.xml: {}", e)))?;

    Ok(xml_content)
}

/// Raw paragraph text: one line per `w:p`, `w:tab` as a tab, `w:br`/`w:cr`
/// as a line break. Run properties, tab-stop definitions and everything
/// outside `w:t` are ignored.
fn parse_docx_xml(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);

    let mut text = String::new();
    let mut in_text_element = false;
    // `w:tabs` in paragraph properties holds `w:tab` stop definitions.
    let mut in_tab_stops = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_element = true,
                b"tabs" => in_tab_stops = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"tab" if !in_tab_stops => text.push('\t'),
                b"br" | b"cr" => text.push('\n'),
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_element = false,
                b"tabs" => in_tab_stops = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text_element {
                    let raw = String::from_utf8_lossy(&e);
                    match quick_xml::escape::unescape(&raw) {
                        Ok(decoded) => text.push_str(&decoded),
                        Err(_) => text.push_str(&raw),
                    }
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text_element {
                    let entity = format!("&{};", String::from_utf8_lossy(&e));
                    match quick_xml::escape::unescape(&entity) {
                        Ok(decoded) => text.push_str(&decoded),
                        Err(_) => text.push_str(&entity),
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::Docx(format!("XML parsing error: {}", e)));
            }
            _ => {}
        }
    }

    Ok(text)
}
