//! PDF import: pull plain text out of an uploaded CV and guess its structure.
//!
//! Extraction and parsing are CPU-bound and synchronous; the HTTP handler runs
//! them inside `tokio::task::spawn_blocking`. Scanned (image-only) PDFs yield
//! no text and are rejected with `ImportError::NoText`.

pub mod handlers;
pub mod parser;

use thiserror::Error;

use crate::cv::CvData;

pub use parser::parse_cv_text;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Multipart field 'file' is missing")]
    MissingFile,

    #[error("Uploaded file is not a PDF")]
    NotPdf,

    #[error("Uploaded file exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("Failed to extract text from PDF: {0}")]
    Extraction(String),

    #[error("PDF contains no extractable text")]
    NoText,
}

/// Text of a PDF, whole and as trimmed non-empty lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedText {
    pub text: String,
    pub lines: Vec<String>,
}

impl ExtractedText {
    pub fn from_text(text: String) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { text, lines }
    }
}

pub fn extract_text(bytes: &[u8]) -> Result<ExtractedText, ImportError> {
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(ImportError::NotPdf);
    }
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ImportError::Extraction(e.to_string()))?;
    if text.trim().is_empty() {
        return Err(ImportError::NoText);
    }
    Ok(ExtractedText::from_text(text))
}

/// Extracts and parses in one go. Blocking.
pub fn import_pdf(bytes: &[u8]) -> Result<CvData, ImportError> {
    let extracted = extract_text(bytes)?;
    Ok(parse_cv_text(&extracted.text, &extracted.lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_pdf_bytes() {
        assert!(matches!(extract_text(b"hello"), Err(ImportError::NotPdf)));
        assert!(matches!(import_pdf(b""), Err(ImportError::NotPdf)));
    }

    #[test]
    fn test_lines_are_trimmed_and_non_empty() {
        let extracted = ExtractedText::from_text("  Jane Doe \n\n\t Engineer\n".to_string());
        assert_eq!(extracted.lines, vec!["Jane Doe", "Engineer"]);
    }
}
