//! The document session: one uploaded file, its rendered pages and a cursor.
//!
//! A [`DocumentSession`] dispatches a [`SourceFile`] by its declared MIME type:
//!
//! - **PDF**: the raw bytes are registered with a [`ResourceAllocator`] and
//!   the resulting URL is published through [`DocumentSession::pdf_url`].
//! - **DOCX**: the rich-text converter produces one page of HTML.
//! - **XLSX**: the first sheet is cut into pages of
//!   [`SessionOptions::rows_per_page`] rows, each serialized on its own.
//!
//! Failures never escape as errors. They are recorded as [`Status::Error`]
//! and published to subscribers.
//!
//! # Example
//!
//! ```
//! use docpane::{DocumentSession, SourceFile};
//!
//! let mut session = DocumentSession::new();
//! session.process_file(&SourceFile::new("notes.txt", "text/plain", b"hi".to_vec()));
//!
//! assert_eq!(session.error(), Some("Unsupported file type".to_string()));
//! assert!(!session.is_loading());
//! assert_eq!(session.content(), "");
//! ```

mod events;
mod options;
mod shared;
mod snapshot;

pub use events::SessionEvent;
pub use options::SessionOptions;
pub use shared::SharedSession;
pub use snapshot::{JsonFormat, SessionSnapshot};

use crate::convert::Converters;
use crate::detect::{DocumentKind, PDF_MIME};
use crate::error::{Error, ProcessError, Result};
use crate::file::SourceFile;
use crate::paginate::paginate;
use crate::resource::{Blob, BlobStore, ResourceAllocator, ResourceLease};
use crossbeam_channel::Receiver;
use events::Subscribers;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Processing state of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Status {
    /// Nothing loaded
    #[default]
    Idle,
    /// A file is being processed
    Loading,
    /// The last file was processed successfully
    Ready,
    /// The last file failed
    Error(ProcessError),
}

impl Status {
    /// Check if processing is in progress.
    pub fn is_loading(&self) -> bool {
        matches!(self, Status::Loading)
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&ProcessError> {
        match self {
            Status::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// Identifies one `process_file` call. Only the latest ticket may commit.
#[derive(Debug, Clone)]
pub(crate) struct Ticket {
    generation: u64,
    kind: DocumentKind,
}

/// The product of decoding, before it is installed on a session.
#[derive(Debug)]
pub(crate) enum Decoded {
    Pdf(Arc<[u8]>),
    Markup(String),
    Pages(Vec<String>),
}

/// State container for the currently viewed document.
pub struct DocumentSession {
    options: SessionOptions,
    converters: Converters,
    allocator: Arc<dyn ResourceAllocator>,
    content: String,
    status: Status,
    file_name: String,
    file_type: String,
    kind: Option<DocumentKind>,
    pdf: Option<ResourceLease>,
    current_page: u32,
    total_pages: u32,
    pages: Vec<String>,
    generation: u64,
    subscribers: Subscribers,
}

impl DocumentSession {
    /// Create a session with default options, the bundled converters and an
    /// in-memory blob store.
    pub fn new() -> Self {
        Self::with_options(SessionOptions::default())
    }

    /// Create a session with custom options.
    pub fn with_options(options: SessionOptions) -> Self {
        Self {
            options,
            converters: Converters::with_defaults(),
            allocator: Arc::new(BlobStore::new()),
            content: String::new(),
            status: Status::Idle,
            file_name: String::new(),
            file_type: String::new(),
            kind: None,
            pdf: None,
            current_page: 1,
            total_pages: 1,
            pages: Vec::new(),
            generation: 0,
            subscribers: Subscribers::default(),
        }
    }

    /// Replace the format collaborators.
    pub fn with_converters(mut self, converters: Converters) -> Self {
        self.converters = converters;
        self
    }

    /// Replace the allocator used for PDF handles.
    pub fn with_allocator(mut self, allocator: Arc<dyn ResourceAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    /// The allocator that issues PDF handles.
    pub fn allocator(&self) -> &Arc<dyn ResourceAllocator> {
        &self.allocator
    }

    /// Return every field to its default and revoke any PDF handle.
    ///
    /// An in-flight `process_file` on a [`SharedSession`] will not commit
    /// after a reset.
    pub fn reset(&mut self) {
        self.content.clear();
        self.status = Status::Idle;
        self.file_name.clear();
        self.file_type.clear();
        self.kind = None;
        self.pdf = None;
        self.current_page = 1;
        self.total_pages = 1;
        self.pages.clear();
        self.generation += 1;
        self.subscribers.notify(SessionEvent::Reset);
    }

    /// Load a file, replacing whatever was loaded before.
    ///
    /// On return the session is either [`Status::Ready`] or
    /// [`Status::Error`]; it is never left loading.
    pub fn process_file(&mut self, file: &SourceFile) {
        let ticket = self.begin(file);
        let outcome = decode_guarded(ticket.kind, file, &self.converters, &self.options);
        self.commit(&ticket, outcome);
    }

    /// Move to a 1-based page. Out-of-range targets are ignored.
    ///
    /// Returns `true` if the target was accepted.
    pub fn go_to_page(&mut self, target: u32) -> bool {
        if target < 1 || target > self.total_pages {
            log::debug!(
                "Ignoring page {} (document has {} pages)",
                target,
                self.total_pages
            );
            return false;
        }

        self.current_page = target;
        if self.kind == Some(DocumentKind::Tabular) {
            if let Some(page) = self.pages.get(target as usize - 1) {
                self.content.clone_from(page);
            }
        }
        self.subscribers
            .notify(SessionEvent::PageChanged { page: target });
        true
    }

    /// Move forward one page.
    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.current_page.saturating_add(1))
    }

    /// Move back one page.
    pub fn previous_page(&mut self) -> bool {
        self.go_to_page(self.current_page.saturating_sub(1))
    }

    /// Receive every subsequent state change.
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        self.subscribers.subscribe()
    }

    /// Markup of the current page. Empty for PDF documents.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Current status.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Check if a file is being processed.
    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    /// Message of the last failure.
    pub fn error(&self) -> Option<String> {
        self.status.error().map(ToString::to_string)
    }

    /// Name of the current file.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Declared MIME type of the current file.
    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    /// Kind of the current file.
    pub fn kind(&self) -> Option<DocumentKind> {
        self.kind
    }

    /// Viewer URL of the current PDF.
    pub fn pdf_url(&self) -> Option<&str> {
        self.pdf.as_ref().map(ResourceLease::url)
    }

    /// Bytes behind [`pdf_url`](Self::pdf_url), as held by the allocator.
    pub fn pdf_blob(&self) -> Option<Blob> {
        self.allocator.resolve(self.pdf_url()?)
    }

    /// 1-based current page.
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Number of pages.
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Markup of a 1-based page.
    ///
    /// Single-page documents answer page 1 with the current content.
    pub fn page(&self, number: u32) -> Option<&str> {
        if number == 0 {
            return None;
        }
        if self.kind == Some(DocumentKind::Tabular) {
            return self.pages.get(number as usize - 1).map(String::as_str);
        }
        (number == 1).then_some(self.content.as_str())
    }

    /// All rendered pages of a tabular document.
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    /// Options in effect.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Copy the observable fields.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            content: self.content.clone(),
            loading: self.is_loading(),
            error: self.error(),
            file_name: self.file_name.clone(),
            file_type: self.file_type.clone(),
            kind: self.kind,
            pdf_url: self.pdf_url().map(str::to_string),
            current_page: self.current_page,
            total_pages: self.total_pages,
        }
    }

    /// Reset, record the file and enter the loading state.
    pub(crate) fn begin(&mut self, file: &SourceFile) -> Ticket {
        self.reset();

        let kind = DocumentKind::from_mime(&file.declared_type);
        self.file_name.clone_from(&file.name);
        self.file_type.clone_from(&file.declared_type);
        self.kind = Some(kind);
        self.status = Status::Loading;

        log::debug!(
            "Processing {} as {} ({} bytes, generation {})",
            file.name,
            kind,
            file.len(),
            self.generation
        );
        self.subscribers.notify(SessionEvent::Loading {
            file_name: file.name.clone(),
        });

        Ticket {
            generation: self.generation,
            kind,
        }
    }

    /// Install a decode outcome. Stale tickets are discarded.
    ///
    /// Returns `true` if the outcome was applied.
    pub(crate) fn commit(
        &mut self,
        ticket: &Ticket,
        outcome: std::result::Result<Decoded, ProcessError>,
    ) -> bool {
        if ticket.generation != self.generation {
            log::debug!(
                "Discarding stale result (generation {}, current {})",
                ticket.generation,
                self.generation
            );
            return false;
        }

        match outcome.and_then(|decoded| self.install(ticket.kind, decoded)) {
            Ok(()) => {
                self.status = Status::Ready;
                self.subscribers.notify(SessionEvent::Ready {
                    kind: ticket.kind,
                    total_pages: self.total_pages,
                });
            }
            Err(err) => {
                log::warn!("{}: {}", self.file_name, err);
                self.subscribers.notify(SessionEvent::Failed {
                    message: err.to_string(),
                });
                self.status = Status::Error(err);
            }
        }
        true
    }

    pub(crate) fn converters(&self) -> &Converters {
        &self.converters
    }

    fn install(
        &mut self,
        kind: DocumentKind,
        decoded: Decoded,
    ) -> std::result::Result<(), ProcessError> {
        match decoded {
            Decoded::Pdf(bytes) => {
                let lease = ResourceLease::acquire(self.allocator.clone(), bytes, PDF_MIME)
                    .map_err(|e| ProcessError::decode(kind, &e))?;
                self.pdf = Some(lease);
            }
            Decoded::Markup(html) => {
                self.content = html;
            }
            Decoded::Pages(pages) => {
                self.total_pages = u32::try_from(pages.len()).unwrap_or(u32::MAX);
                self.current_page = 1;
                self.content = pages.first().cloned().unwrap_or_default();
                self.pages = pages;
            }
        }
        Ok(())
    }
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSession")
            .field("status", &self.status)
            .field("file_name", &self.file_name)
            .field("file_type", &self.file_type)
            .field("kind", &self.kind)
            .field("pdf", &self.pdf)
            .field("current_page", &self.current_page)
            .field("total_pages", &self.total_pages)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Decode a file, turning a panicking collaborator into an outer failure.
pub(crate) fn decode_guarded(
    kind: DocumentKind,
    file: &SourceFile,
    converters: &Converters,
    options: &SessionOptions,
) -> std::result::Result<Decoded, ProcessError> {
    panic::catch_unwind(AssertUnwindSafe(|| decode(kind, file, converters, options)))
        .unwrap_or_else(|payload| Err(ProcessError::Outer(panic_message(payload.as_ref()))))
}

fn decode(
    kind: DocumentKind,
    file: &SourceFile,
    converters: &Converters,
    options: &SessionOptions,
) -> std::result::Result<Decoded, ProcessError> {
    let result = match kind {
        DocumentKind::Pdf => Ok(Decoded::Pdf(Arc::clone(&file.bytes))),
        DocumentKind::Docx => converters
            .rich_text
            .convert(&file.bytes, &options.style_map)
            .map(Decoded::Markup),
        DocumentKind::Tabular => decode_tabular(&file.bytes, converters, options),
        DocumentKind::Unsupported => return Err(ProcessError::Unsupported),
    };
    result.map_err(|e| ProcessError::decode(kind, &e))
}

fn decode_tabular(
    bytes: &[u8],
    converters: &Converters,
    options: &SessionOptions,
) -> Result<Decoded> {
    let workbook = converters.spreadsheet.read(bytes)?;
    let sheet = workbook.into_first_sheet().ok_or(Error::NoSheets)?;
    log::debug!(
        "Sheet '{}': {} rows x {} columns",
        sheet.name,
        sheet.grid.row_count(),
        sheet.grid.column_count()
    );

    Ok(Decoded::Pages(paginate(
        sheet.grid.rows(),
        options.rows_per_page,
        converters.serializer.as_ref(),
        options.parallel,
    )))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
