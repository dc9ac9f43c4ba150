//! Format collaborators used by a session.
//!
//! A session never decodes formats itself. It calls three narrow traits:
//! a [`RichTextConverter`] for DOCX, a [`SpreadsheetReader`] for XLSX, and a
//! [`GridSerializer`] that turns each page chunk of rows into markup. The
//! [`Converters`] bundle holds one of each and defaults to the bundled
//! implementations.
//!
//! # Example
//!
//! ```
//! use docpane::convert::{Converters, GridSerializer, HtmlTableSerializer};
//! use docpane::model::CellValue;
//! use std::sync::Arc;
//!
//! let converters = Converters::with_defaults()
//!     .with_serializer(Arc::new(HtmlTableSerializer::new().with_title("Budget")));
//!
//! let html = converters
//!     .serializer
//!     .serialize(&[vec![CellValue::String("Total".into())]]);
//! assert!(html.contains("<title>Budget</title>"));
//! ```

mod docx;
mod html;
mod package;
mod style_map;
mod xlsx;

pub use docx::DocxConverter;
pub use html::HtmlTableSerializer;
pub use style_map::{StyleMap, StyleMapping, StyleTarget};
pub use xlsx::XlsxReader;

use crate::error::Result;
use crate::model::{Row, Workbook};
use std::fmt;
use std::sync::Arc;

/// Converts a rich-text document to HTML.
pub trait RichTextConverter: Send + Sync {
    /// Get the name of this converter.
    fn name(&self) -> &str;

    /// Convert the whole document, applying the style map.
    fn convert(&self, bytes: &[u8], style_map: &StyleMap) -> Result<String>;
}

/// Parses a spreadsheet into sheets of cell grids.
pub trait SpreadsheetReader: Send + Sync {
    /// Get the name of this reader.
    fn name(&self) -> &str;

    /// Parse the workbook. Sheets are returned in workbook order.
    fn read(&self, bytes: &[u8]) -> Result<Workbook>;
}

/// Serializes a chunk of rows into standalone page markup.
pub trait GridSerializer: Send + Sync {
    /// Serialize the rows. Must not fail; an empty slice yields an empty page.
    fn serialize(&self, rows: &[Row]) -> String;
}

/// The collaborators a session delegates to.
#[derive(Clone)]
pub struct Converters {
    /// DOCX to HTML
    pub rich_text: Arc<dyn RichTextConverter>,

    /// XLSX to grids
    pub spreadsheet: Arc<dyn SpreadsheetReader>,

    /// Page chunk to HTML
    pub serializer: Arc<dyn GridSerializer>,
}

impl Converters {
    /// Create a bundle with the bundled DOCX, XLSX and HTML implementations.
    pub fn with_defaults() -> Self {
        Self {
            rich_text: Arc::new(DocxConverter::new()),
            spreadsheet: Arc::new(XlsxReader::new()),
            serializer: Arc::new(HtmlTableSerializer::new()),
        }
    }

    /// Replace the rich-text converter.
    pub fn with_rich_text(mut self, converter: Arc<dyn RichTextConverter>) -> Self {
        self.rich_text = converter;
        self
    }

    /// Replace the spreadsheet reader.
    pub fn with_spreadsheet(mut self, reader: Arc<dyn SpreadsheetReader>) -> Self {
        self.spreadsheet = reader;
        self
    }

    /// Replace the grid serializer.
    pub fn with_serializer(mut self, serializer: Arc<dyn GridSerializer>) -> Self {
        self.serializer = serializer;
        self
    }
}

impl Default for Converters {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for Converters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converters")
            .field("rich_text", &self.rich_text.name())
            .field("spreadsheet", &self.spreadsheet.name())
            .finish_non_exhaustive()
    }
}
