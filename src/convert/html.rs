//! HTML table serialization for grid chunks.

use super::GridSerializer;
use crate::model::{CellRef, CellValue, Row};
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Serializes rows into a standalone HTML document holding one table.
///
/// Cell coordinates restart at `A1` for every call, so each page chunk reads
/// as an independent sheet.
#[derive(Debug, Clone)]
pub struct HtmlTableSerializer {
    title: String,
    id_prefix: String,
}

impl HtmlTableSerializer {
    /// Create a serializer with the default title and cell id prefix.
    pub fn new() -> Self {
        Self {
            title: "Sheet Page".to_string(),
            id_prefix: "cell-".to_string(),
        }
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the prefix of generated cell ids.
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    fn render_cell(&self, output: &mut String, value: &CellValue, at: CellRef) {
        output.push_str("<td data-t=\"");
        output.push(value.type_code());
        output.push('"');

        let text = value.to_string();
        if !value.is_empty() {
            output.push_str(" data-v=\"");
            output.push_str(&encode_double_quoted_attribute(&raw_value(value)));
            output.push('"');
        }

        output.push_str(" id=\"");
        output.push_str(&encode_double_quoted_attribute(&self.id_prefix));
        output.push_str(&at.to_string());
        output.push_str("\">");
        output.push_str(&encode_text(&text));
        output.push_str("</td>");
    }
}

impl Default for HtmlTableSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl GridSerializer for HtmlTableSerializer {
    fn serialize(&self, rows: &[Row]) -> String {
        let mut output = String::with_capacity(128 + rows.len() * 64);
        output.push_str("<html><head><meta charset=\"utf-8\"/><title>");
        output.push_str(&encode_text(&self.title));
        output.push_str("</title></head><body><table>");

        for (r, row) in rows.iter().enumerate() {
            output.push_str("<tr>");
            for (c, value) in row.iter().enumerate() {
                self.render_cell(&mut output, value, CellRef::new(r as u32, c as u32));
            }
            output.push_str("</tr>");
        }

        output.push_str("</table></body></html>");
        output
    }
}

/// Unformatted value written to `data-v`.
fn raw_value(value: &CellValue) -> String {
    match value {
        CellValue::Number(n) => n.to_string(),
        CellValue::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
