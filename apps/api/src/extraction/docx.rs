use std::io::{Cursor, Read};

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::ExtractError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Concatenates the text of every `w:p` paragraph in the main document part,
/// each followed by a newline (empty paragraphs included).
pub(super) fn extract_docx_text(data: &[u8]) -> Result<String, ExtractError> {
    let xml = read_document_part(data)?;
    paragraphs_to_text(&xml)
}

fn read_document_part(data: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| ExtractError::Docx(format!("not a DOCX archive: {e}")))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractError::Docx(format!("missing {DOCUMENT_PART}: {e}")))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

fn paragraphs_to_text(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"w:t" {
                    in_text_run = true;
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:p" => out.push('\n'),
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text_run {
                    let value = e.xml_content().map_err(docx_error)?;
                    out.push_str(&value);
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text_run {
                    if let Some(ch) = e.resolve_char_ref().map_err(docx_error)? {
                        out.push(ch);
                    } else {
                        let name = e.decode().map_err(docx_error)?;
                        if let Some(resolved) = resolve_predefined_entity(&name) {
                            out.push_str(resolved);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(docx_error(e)),
            _ => {}
        }
    }

    Ok(out)
}

fn docx_error(e: impl std::fmt::Display) -> ExtractError {
    ExtractError::Docx(e.to_string())
}
