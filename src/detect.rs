//! Document kind classification and type detection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::path::Path;

/// MIME type of PDF documents.
pub const PDF_MIME: &str = "application/pdf";

/// MIME type of Word (OOXML) documents.
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// MIME type of Excel (OOXML) workbooks.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Fallback MIME type when nothing better is known.
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Local file header signature of a ZIP archive.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// The conversion path a document takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Displayed directly from its bytes
    Pdf,
    /// Converted to HTML as a single page
    Docx,
    /// Spreadsheet, paginated by row count
    Tabular,
    /// Anything else
    Unsupported,
}

impl DocumentKind {
    /// Classify a declared MIME type.
    ///
    /// Matching is exact: parameters or different casing make the type
    /// unsupported.
    pub fn from_mime(mime: &str) -> Self {
        match mime {
            PDF_MIME => DocumentKind::Pdf,
            DOCX_MIME => DocumentKind::Docx,
            XLSX_MIME => DocumentKind::Tabular,
            _ => DocumentKind::Unsupported,
        }
    }

    /// Canonical MIME type of this kind, if it has one.
    pub fn mime_type(&self) -> Option<&'static str> {
        match self {
            DocumentKind::Pdf => Some(PDF_MIME),
            DocumentKind::Docx => Some(DOCX_MIME),
            DocumentKind::Tabular => Some(XLSX_MIME),
            DocumentKind::Unsupported => None,
        }
    }

    /// Whether documents of this kind have more than one page of markup.
    pub fn is_paginated(&self) -> bool {
        matches!(self, DocumentKind::Tabular)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DocumentKind::Pdf => "PDF",
            DocumentKind::Docx => "DOCX",
            DocumentKind::Tabular => "XLSX",
            DocumentKind::Unsupported => "unsupported",
        };
        f.write_str(label)
    }
}

/// Guess a MIME type from the file extension.
///
/// # Example
/// ```
/// use docpane::detect::guess_mime_from_path;
///
/// assert_eq!(guess_mime_from_path("report.pdf").as_deref(), Some("application/pdf"));
/// ```
pub fn guess_mime_from_path<P: AsRef<Path>>(path: P) -> Option<String> {
    mime_guess::from_path(path)
        .first_raw()
        .map(|mime| mime.to_string())
}

/// Sniff a MIME type from file content.
///
/// Recognizes PDF by its header and OOXML packages by their main part.
/// Returns `None` when the bytes match none of the supported kinds.
pub fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(PDF_MAGIC) {
        return Some(PDF_MIME);
    }

    if !data.starts_with(ZIP_MAGIC) {
        return None;
    }

    let archive = zip::ZipArchive::new(Cursor::new(data)).ok()?;
    let mut names = archive.file_names();
    let mime = names.find_map(|name| match name {
        "word/document.xml" => Some(DOCX_MIME),
        "xl/workbook.xml" => Some(XLSX_MIME),
        _ => None,
    });
    log::debug!("Sniffed ZIP package as {:?}", mime);
    mime
}

/// Check if bytes start with a PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    data.starts_with(PDF_MAGIC)
}
