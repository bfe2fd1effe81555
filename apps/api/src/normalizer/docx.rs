//! Best-effort plain-text extraction from OOXML word-processing documents.

use std::io::{Cursor, Read};

use anyhow::{bail, Context};
use quick_xml::events::Event;
use quick_xml::Reader;

/// External collaborator that pulls plain text out of a word-processing document.
pub trait DocumentTextExtractor: Send + Sync {
    fn extract_text(&self, data: &[u8]) -> anyhow::Result<String>;
}

/// Inflated size cap for `word/document.xml`. The upload limit only bounds the
/// compressed package.
pub const DEFAULT_MAX_DOCUMENT_XML_BYTES: u64 = 32 * 1024 * 1024;

/// Reads `word/document.xml` from the package and emits one line per non-empty paragraph.
#[derive(Debug, Clone, Copy)]
pub struct DocxTextExtractor {
    max_document_xml_bytes: u64,
}

impl Default for DocxTextExtractor {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_DOCUMENT_XML_BYTES)
    }
}

impl DocxTextExtractor {
    pub fn with_limit(max_document_xml_bytes: u64) -> Self {
        Self {
            max_document_xml_bytes,
        }
    }
}

impl DocumentTextExtractor for DocxTextExtractor {
    fn extract_text(&self, data: &[u8]) -> anyhow::Result<String> {
        let xml = read_document_xml(data, self.max_document_xml_bytes)?;
        extract_paragraphs(&xml)
    }
}

fn read_document_xml(data: &[u8], limit: u64) -> anyhow::Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    let entry = archive.by_name("word/document.xml")?;

    if entry.size() > limit {
        bail!(
            "document body inflates to {} bytes, over the {limit}-byte limit",
            entry.size()
        );
    }

    // The declared size can lie; never read past the limit regardless.
    let mut raw = Vec::new();
    entry.take(limit + 1).read_to_end(&mut raw)?;
    if raw.len() as u64 > limit {
        bail!("document body exceeds the {limit}-byte limit");
    }

    String::from_utf8(raw).context("document body is not valid UTF-8")
}

fn extract_paragraphs(xml: &str) -> anyhow::Result<String> {
    let mut reader = Reader::from_str(xml);

    let mut buf = Vec::new();
    let mut current = String::new();
    let mut lines = Vec::new();
    let mut in_paragraph = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"w:p" => {
                in_paragraph = true;
                current.clear();
            }
            Event::End(e) if e.name().as_ref() == b"w:p" => {
                push_line(&mut lines, &current);
                current.clear();
                in_paragraph = false;
            }
            Event::Empty(e) if in_paragraph => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_paragraph => {
                current.push_str(&e.xml_content()?);
            }
            Event::GeneralRef(e) if in_paragraph => {
                if let Some(ch) = resolve_entity(&e.decode()?) {
                    current.push(ch);
                }
            }
            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    Ok(lines.join("\n"))
}

fn push_line(lines: &mut Vec<String>, paragraph: &str) {
    let trimmed = paragraph.trim();
    if !trimmed.is_empty() {
        lines.push(trimmed.to_string());
    }
}

/// Resolves the predefined XML entities and numeric character references.
fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_docx(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn wrap_body(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        )
    }

    #[test]
    fn test_extracts_one_line_per_paragraph() {
        let xml = wrap_body(
            "<w:p><w:r><w:t>Omar Khalid</w:t></w:r></w:p>\
             <w:p></w:p>\
             <w:p><w:r><w:t>Site </w:t></w:r><w:r><w:t>Engineer</w:t></w:r></w:p>",
        );
        let text = DocxTextExtractor::default().extract_text(&build_docx(&xml)).unwrap();
        assert_eq!(text, "Omar Khalid\nSite Engineer");
    }

    #[test]
    fn test_tabs_breaks_and_entities() {
        let xml = wrap_body(
            "<w:p><w:r><w:t>2019</w:t><w:tab/><w:t>R&amp;D Lead</w:t><w:br/><w:t>&#x41;BC Ltd</w:t></w:r></w:p>",
        );
        let text = DocxTextExtractor::default().extract_text(&build_docx(&xml)).unwrap();
        assert_eq!(text, "2019\tR&D Lead\nABC Ltd");
    }

    #[test]
    fn test_document_over_limit_is_rejected() {
        let paragraph = "<w:p><w:r><w:t>aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa</w:t></w:r></w:p>";
        let xml = wrap_body(&paragraph.repeat(200));
        let data = build_docx(&xml);
        assert!(data.len() < xml.len());

        let err = DocxTextExtractor::with_limit(4096)
            .extract_text(&data)
            .unwrap_err();
        assert!(err.to_string().contains("4096-byte limit"), "{err}");

        let text = DocxTextExtractor::with_limit(xml.len() as u64)
            .extract_text(&data)
            .unwrap();
        assert_eq!(text.lines().count(), 200);
    }

    #[test]
    fn test_missing_document_part_is_an_error() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/styles.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<w:styles/>").unwrap();
        let data = writer.finish().unwrap().into_inner();

        assert!(DocxTextExtractor::default().extract_text(&data).is_err());
    }

    #[test]
    fn test_not_a_zip_is_an_error() {
        assert!(DocxTextExtractor::default().extract_text(b"plain bytes").is_err());
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("lt"), Some('<'));
        assert_eq!(resolve_entity("#38"), Some('&'));
        assert_eq!(resolve_entity("#x627"), Some('ا'));
        assert_eq!(resolve_entity("nbsp"), None);
    }
}
