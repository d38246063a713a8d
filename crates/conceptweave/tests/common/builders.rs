//! Builders for document fixtures, produced in memory.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use zip::write::SimpleFileOptions;

fn zip_parts(parts: &[(String, String)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        writer
            .start_file(name.as_str(), SimpleFileOptions::default())
            .expect("Failed to start zip entry");
        writer
            .write_all(content.as_bytes())
            .expect("Failed to write zip entry");
    }
    writer
        .finish()
        .expect("Failed to finish zip archive")
        .into_inner()
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Builds a PPTX archive. Slides keep the number they are added with, so
/// gaps model image-only or deleted slides.
pub struct PptxBuilder {
    slides: Vec<(u32, Option<String>)>,
}

impl PptxBuilder {
    pub fn new() -> Self {
        Self { slides: Vec::new() }
    }

    pub fn slide(mut self, number: u32, text: &str) -> Self {
        self.slides.push((number, Some(text.to_string())));
        self
    }

    /// A slide holding only a picture.
    pub fn image_slide(mut self, number: u32) -> Self {
        self.slides.push((number, None));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut parts = vec![(
            "[Content_Types].xml".to_string(),
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#
                .to_string(),
        )];

        for (number, text) in self.slides {
            let body = match text {
                Some(text) => format!(
                    "<p:sp><p:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>",
                    escape_xml(&text)
                ),
                None => r#"<p:pic><p:blipFill><a:blip r:embed="rId2"/></p:blipFill></p:pic>"#
                    .to_string(),
            };
            parts.push((
                format!("ppt/slides/slide{}.xml", number),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
                    body
                ),
            ));
        }

        zip_parts(&parts)
    }
}

impl Default for PptxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a DOCX archive with one run per paragraph.
pub struct DocxBuilder {
    paragraphs: Vec<String>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self {
            paragraphs: Vec::new(),
        }
    }

    pub fn paragraph(mut self, text: &str) -> Self {
        self.paragraphs.push(text.to_string());
        self
    }

    pub fn build(self) -> Vec<u8> {
        let body: String = self
            .paragraphs
            .iter()
            .map(|p| {
                format!(
                    "<w:p><w:pPr><w:pStyle w:val=\"Normal\"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
                    escape_xml(p)
                )
            })
            .collect();

        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        );

        zip_parts(&[("word/document.xml".to_string(), document)])
    }
}

impl Default for DocxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A PDF with one line of Courier text per page.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for line in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("Failed to encode page content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to write PDF");
    bytes
}
