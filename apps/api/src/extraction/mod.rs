//! Text extraction: turns an uploaded document into plain text.
//!
//! The strategy is picked from the file extension (case-insensitive):
//! `.txt` is read verbatim, `.pdf` goes through the PDF text layer, `.docx`
//! is unpacked paragraph by paragraph. Everything else is an `ExtractError`.
//! Callers treat any error as "skip this document"; nothing here panics past
//! the function boundary, including panics raised inside the PDF parser.

mod docx;

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type: {0:?}")]
    UnsupportedFileType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Text file is not valid UTF-8")]
    InvalidUtf8,

    #[error("PDF extraction error: {0}")]
    Pdf(String),

    #[error("DOCX extraction error: {0}")]
    Docx(String),
}

/// Document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
    Docx,
}

impl DocumentKind {
    pub fn from_file_name(file_name: &str) -> Result<Self, ExtractError> {
        let extension = file_extension(file_name);
        match extension.as_str() {
            "txt" => Ok(Self::PlainText),
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            _ => Err(ExtractError::UnsupportedFileType(extension)),
        }
    }
}

/// Lower-cased extension of `file_name`, or an empty string if there is none.
pub fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Reads `path` and extracts its text according to its extension.
pub fn extract_from_path(path: &Path) -> Result<String, ExtractError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    // reject unsupported files before touching the disk
    DocumentKind::from_file_name(file_name)?;
    let bytes = std::fs::read(path)?;
    extract_from_bytes(file_name, &bytes)
}

/// Extracts text from an in-memory document whose format is given by `file_name`.
pub fn extract_from_bytes(file_name: &str, bytes: &[u8]) -> Result<String, ExtractError> {
    let kind = DocumentKind::from_file_name(file_name)?;
    extract_bytes(kind, bytes)
}

fn extract_bytes(kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractError> {
    match kind {
        DocumentKind::PlainText => String::from_utf8(bytes.to_vec())
            .map_err(|_| ExtractError::InvalidUtf8),
        DocumentKind::Pdf => extract_pdf_text(bytes),
        DocumentKind::Docx => docx::extract_docx_text(bytes),
    }
}

/// pdf-extract walks every page in document order and concatenates the text layer.
/// It is known to panic on some malformed inputs, so the call is unwound here.
fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::Pdf(e.to_string())),
        Err(_) => Err(ExtractError::Pdf("PDF parser panicked".to_string())),
    }
}
