//! Session options and configuration.

use crate::convert::StyleMap;
use crate::paginate::DEFAULT_ROWS_PER_PAGE;

/// Options applied by a session while decoding documents.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Rows per page for tabular documents
    pub rows_per_page: usize,

    /// Style rules handed to the rich-text converter
    pub style_map: StyleMap,

    /// Whether to serialize page chunks in parallel
    pub parallel: bool,
}

impl SessionOptions {
    /// Create new session options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set rows per page. Zero is clamped to one.
    pub fn with_rows_per_page(mut self, rows: usize) -> Self {
        self.rows_per_page = rows.max(1);
        self
    }

    /// Replace the style map, dropping the default heading rules.
    pub fn with_style_map(mut self, style_map: StyleMap) -> Self {
        self.style_map = style_map;
        self
    }

    /// Add style rules that take priority over the current ones.
    pub fn with_style_rules(mut self, rules: StyleMap) -> Self {
        let mut merged = rules;
        merged.extend(std::mem::take(&mut self.style_map));
        self.style_map = merged;
        self
    }

    /// Enable or disable parallel page serialization.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel page serialization.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            style_map: StyleMap::default_headings(),
            parallel: true,
        }
    }
}
