//! Error types for docpane library.

use crate::detect::DocumentKind;
use std::io;
use thiserror::Error;

/// Result type alias for docpane operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while decoding documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The OOXML container (ZIP archive) could not be read.
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// Malformed XML inside a document part.
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// A required part is missing from the package.
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// The workbook has no worksheets.
    #[error("Workbook contains no sheets")]
    NoSheets,

    /// A cell reference such as `B12` could not be decoded.
    #[error("Invalid cell reference: {0}")]
    InvalidCellReference(String),

    /// A sheet's used range holds more cells than a grid may allocate.
    #[error("Sheet too large: {rows} rows x {columns} columns exceeds {limit} cells")]
    SheetTooLarge {
        /// Rows in the used range
        rows: u64,
        /// Columns in the used range
        columns: u64,
        /// Cell limit that was exceeded
        limit: u64,
    },

    /// A style mapping rule could not be parsed.
    #[error("Invalid style mapping: {0}")]
    InvalidStyleMapping(String),

    /// A resource handle could not be allocated.
    #[error("Resource error: {0}")]
    Resource(String),

    /// Error while serializing output (HTML, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::FileNotFound => Error::MissingPart(err.to_string()),
            _ => Error::Zip(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.to_string())
    }
}

/// Failure recorded on a session by `process_file`.
///
/// The `Display` output is the message surfaced to the UI layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// The declared MIME type is not one of the recognized kinds.
    #[error("Unsupported file type")]
    Unsupported,

    /// A collaborator failed while decoding a recognized kind.
    #[error("Error processing {kind} file: {message}")]
    Decode {
        /// Kind that was being decoded
        kind: DocumentKind,
        /// Underlying error message
        message: String,
    },

    /// A failure outside any kind-specific path.
    #[error("Error processing file: {0}")]
    Outer(String),
}

impl ProcessError {
    /// Build a decode failure from a library error.
    pub fn decode(kind: DocumentKind, err: &Error) -> Self {
        ProcessError::Decode {
            kind,
            message: err.to_string(),
        }
    }
}
