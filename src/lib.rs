//! # docpane
//!
//! Document session state for viewer front ends.
//!
//! A session holds exactly one uploaded document and exposes it as pages of
//! markup: PDFs are handed to an external viewer through a revocable URL,
//! DOCX files become one page of HTML, and XLSX sheets are cut into
//! fixed-size pages of HTML tables.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docpane::open_file;
//!
//! fn main() -> docpane::Result<()> {
//!     let mut session = open_file("budget.xlsx")?;
//!
//!     println!("{} pages", session.total_pages());
//!     session.go_to_page(2);
//!     println!("{}", session.content());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **MIME dispatch**: PDF, DOCX and XLSX, everything else is rejected
//! - **Pagination**: 42 rows per page by default, chunks serialized in parallel
//! - **Style maps**: paragraph and run style rules for DOCX headings
//! - **Observation**: subscribe to session events over a channel
//! - **Shared sessions**: last-started load wins across threads

pub mod convert;
pub mod detect;
pub mod error;
pub mod file;
pub mod model;
pub mod paginate;
pub mod resource;
pub mod session;

// Re-export commonly used types
pub use convert::{
    Converters, DocxConverter, GridSerializer, HtmlTableSerializer, RichTextConverter,
    SpreadsheetReader, StyleMap, StyleMapping, StyleTarget, XlsxReader,
};
pub use detect::{DocumentKind, DOCX_MIME, PDF_MIME, XLSX_MIME};
pub use error::{Error, ProcessError, Result};
pub use file::SourceFile;
pub use model::{CellValue, Grid, Row, Sheet, Workbook};
pub use paginate::DEFAULT_ROWS_PER_PAGE;
pub use resource::{Blob, BlobStore, ResourceAllocator, ResourceHandle, ResourceLease};
pub use session::{
    DocumentSession, JsonFormat, SessionEvent, SessionOptions, SessionSnapshot, SharedSession,
    Status,
};

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Open a file in a new session with default options.
///
/// The MIME type is guessed from the extension, then from the content.
/// Only reading the file can fail; decoding failures are recorded on the
/// returned session.
///
/// # Example
///
/// ```no_run
/// use docpane::open_file;
///
/// let session = open_file("report.docx").unwrap();
/// if let Some(message) = session.error() {
///     eprintln!("{}", message);
/// }
/// ```
pub fn open_file<P: AsRef<Path>>(path: P) -> Result<DocumentSession> {
    Docpane::new().open(path)
}

/// Open a file with custom session options.
pub fn open_file_with_options<P: AsRef<Path>>(
    path: P,
    options: SessionOptions,
) -> Result<DocumentSession> {
    Docpane::new().with_options(options).open(path)
}

/// Process in-memory bytes in a new session with default options.
///
/// # Example
///
/// ```
/// use docpane::{open_bytes, Status};
///
/// let session = open_bytes("paper.pdf", "application/pdf", b"%PDF-1.7".to_vec());
/// assert_eq!(session.status(), &Status::Ready);
/// assert!(session.pdf_url().is_some());
/// ```
pub fn open_bytes(
    name: impl Into<String>,
    declared_type: impl Into<String>,
    bytes: impl Into<Arc<[u8]>>,
) -> DocumentSession {
    Docpane::new().open_file(&SourceFile::new(name, declared_type, bytes))
}

/// Builder for configuring and opening sessions.
///
/// # Example
///
/// ```no_run
/// use docpane::{Docpane, StyleMap};
///
/// let rules = StyleMap::parse("p[style-name='Title'] => h1:fresh")?;
/// let session = Docpane::new()
///     .with_rows_per_page(20)
///     .with_style_rules(rules)
///     .open("report.docx")?;
/// # Ok::<(), docpane::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct Docpane {
    options: SessionOptions,
    converters: Option<Converters>,
    allocator: Option<Arc<dyn ResourceAllocator>>,
    declared_type: Option<String>,
}

impl Docpane {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all session options.
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Set rows per page for spreadsheets.
    pub fn with_rows_per_page(mut self, rows: usize) -> Self {
        self.options = self.options.with_rows_per_page(rows);
        self
    }

    /// Add style rules ahead of the defaults.
    pub fn with_style_rules(mut self, rules: StyleMap) -> Self {
        self.options = self.options.with_style_rules(rules);
        self
    }

    /// Disable parallel page serialization.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Use custom format collaborators.
    pub fn with_converters(mut self, converters: Converters) -> Self {
        self.converters = Some(converters);
        self
    }

    /// Issue PDF handles from a shared allocator, such as the store a
    /// viewer resolves URLs against.
    pub fn with_allocator(mut self, allocator: Arc<dyn ResourceAllocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }

    /// Declare the MIME type instead of guessing it from the path.
    pub fn with_declared_type(mut self, mime: impl Into<String>) -> Self {
        self.declared_type = Some(mime.into());
        self
    }

    /// Create an empty session with this configuration.
    pub fn session(&self) -> DocumentSession {
        let mut session = DocumentSession::with_options(self.options.clone());
        if let Some(converters) = &self.converters {
            session = session.with_converters(converters.clone());
        }
        if let Some(allocator) = &self.allocator {
            session = session.with_allocator(allocator.clone());
        }
        session
    }

    /// Read a file from disk and process it.
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<DocumentSession> {
        let mut file = SourceFile::from_path(path)?;
        if let Some(mime) = &self.declared_type {
            file = file.with_declared_type(mime.clone());
        }
        Ok(self.open_file(&file))
    }

    /// Process an in-memory file.
    pub fn open_file(&self, file: &SourceFile) -> DocumentSession {
        let mut session = self.session();
        session.process_file(file);
        session
    }
}

impl fmt::Debug for Docpane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Docpane")
            .field("options", &self.options)
            .field("converters", &self.converters)
            .field("custom_allocator", &self.allocator.is_some())
            .field("declared_type", &self.declared_type)
            .finish()
    }
}
