//! Serializable copies of session state.

use crate::detect::DocumentKind;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// The fields a UI layer reads, copied out of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Markup of the current page
    pub content: String,

    /// A file is being processed
    pub loading: bool,

    /// Error message of the last attempt, if it failed
    pub error: Option<String>,

    /// Display name of the current file
    pub file_name: String,

    /// Declared MIME type of the current file
    pub file_type: String,

    /// Classification of the declared type
    pub kind: Option<DocumentKind>,

    /// Viewer URL of a PDF document
    pub pdf_url: Option<String>,

    /// 1-based current page
    pub current_page: u32,

    /// Number of pages
    pub total_pages: u32,
}

impl SessionSnapshot {
    /// Convert the snapshot to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        let result = match format {
            JsonFormat::Pretty => serde_json::to_string_pretty(self),
            JsonFormat::Compact => serde_json::to_string(self),
        };

        result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            content: String::new(),
            loading: false,
            error: None,
            file_name: String::new(),
            file_type: String::new(),
            kind: None,
            pdf_url: None,
            current_page: 1,
            total_pages: 1,
        }
    }
}
