//! The file-like input handed to a session.

use crate::detect::{guess_mime_from_path, sniff_mime, OCTET_STREAM_MIME};
use crate::error::Result;
use std::path::Path;
use std::sync::Arc;

/// An uploaded file: display name, declared MIME type and raw bytes.
///
/// The bytes are reference counted so that a PDF resource handle can share
/// them without copying.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Display name (usually the file name without directories)
    pub name: String,

    /// Declared MIME type
    pub declared_type: String,

    /// Raw file content
    pub bytes: Arc<[u8]>,
}

impl SourceFile {
    /// Create a file from its parts.
    pub fn new(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk.
    ///
    /// The declared type is guessed from the extension, then from the
    /// content, and falls back to `application/octet-stream`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use docpane::SourceFile;
    ///
    /// let file = SourceFile::from_path("budget.xlsx").unwrap();
    /// println!("{} ({})", file.name, file.declared_type);
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let declared_type = guess_mime_from_path(path)
            .or_else(|| sniff_mime(&bytes).map(str::to_string))
            .unwrap_or_else(|| OCTET_STREAM_MIME.to_string());

        log::debug!("Read {} ({} bytes) as {}", name, bytes.len(), declared_type);
        Ok(Self::new(name, declared_type, bytes))
    }

    /// Override the declared MIME type.
    pub fn with_declared_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = declared_type.into();
        self
    }

    /// Size of the content in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the file has no content.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
