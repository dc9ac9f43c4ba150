//! Spreadsheet model types.
//!
//! Readers produce these types; serializers and the pagination policy
//! consume them. Cell values are kept raw: no number formats, no formula
//! evaluation.

mod grid;
mod workbook;

pub use grid::{column_name, CellRef, CellValue, Grid, Row, MAX_COLUMNS, MAX_ROWS};
pub use workbook::{Sheet, Workbook};
