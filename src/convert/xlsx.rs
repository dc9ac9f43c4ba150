//! XLSX spreadsheet reader.

use super::package::{attr, resolve_target, Package};
use super::SpreadsheetReader;
use crate::error::{Error, Result};
use crate::model::{CellRef, CellValue, Grid, Sheet, Workbook, MAX_COLUMNS, MAX_ROWS};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Largest grid a sheet may expand to, counting blank cells inside the
/// used range.
pub const MAX_GRID_CELLS: u64 = 4_000_000;

/// Reads OOXML workbooks into [`Workbook`] grids.
///
/// Cell values are read raw: shared and inline strings, numbers, booleans
/// and error literals. Formulas contribute their cached value only.
#[derive(Debug, Clone, Default)]
pub struct XlsxReader {
    _private: (),
}

impl XlsxReader {
    /// Create a new XLSX reader.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl SpreadsheetReader for XlsxReader {
    fn name(&self) -> &str {
        "xlsx"
    }

    fn read(&self, bytes: &[u8]) -> Result<Workbook> {
        let mut package = Package::open(bytes)?;

        let entries = parse_workbook(&package.read_part(WORKBOOK_PART)?)?;
        let rels = package.relationships(WORKBOOK_RELS_PART)?;
        let shared = match package.read_optional(SHARED_STRINGS_PART)? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        };
        log::debug!(
            "Workbook has {} sheets, {} shared strings",
            entries.len(),
            shared.len()
        );

        let mut workbook = Workbook::new();
        for (index, entry) in entries.into_iter().enumerate() {
            let part = entry
                .rel_id
                .as_ref()
                .and_then(|id| rels.get(id))
                .map(|rel| resolve_target("xl", &rel.target))
                .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", index + 1));

            let grid = parse_sheet(&package.read_part(&part)?, &shared)?;
            workbook.add_sheet(Sheet::new(entry.name, grid));
        }

        Ok(workbook)
    }
}

struct SheetEntry {
    name: String,
    rel_id: Option<String>,
}

fn parse_workbook(xml: &[u8]) -> Result<Vec<SheetEntry>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut entries = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attr(&e, b"name")?.unwrap_or_default();
                let rel_id = attr(&e, b"id")?;
                entries.push(SheetEntry { name, rel_id });
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

/// Parse the shared strings table. Rich text runs are concatenated and
/// phonetic hints (`rPh`) are dropped.
fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"rPh" => in_phonetic = true,
                b"t" if !in_phonetic => in_text = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::CData(t) if in_text => current.push_str(&String::from_utf8_lossy(&t)),
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                b"si" => strings.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Cell being assembled while its children are read.
#[derive(Default)]
struct PendingCell {
    at: Option<CellRef>,
    cell_type: Option<String>,
    value: String,
    inline: String,
}

impl PendingCell {
    fn resolve(self, shared: &[String]) -> CellValue {
        match self.cell_type.as_deref() {
            Some("s") => match self.value.trim().parse::<usize>().ok().and_then(|i| shared.get(i)) {
                Some(s) => CellValue::String(s.clone()),
                None => {
                    log::warn!("Shared string index {:?} out of range", self.value);
                    CellValue::Empty
                }
            },
            Some("str") | Some("d") => CellValue::String(self.value),
            Some("inlineStr") => CellValue::String(self.inline),
            Some("b") => CellValue::Bool(self.value.trim() == "1"),
            Some("e") => CellValue::Error(self.value),
            _ if self.value.is_empty() => CellValue::Empty,
            _ => match self.value.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::String(self.value),
            },
        }
    }
}

/// Parse a worksheet part into a grid.
///
/// The grid starts at the `<dimension>` top-left corner (or the first used
/// cell) and ends at the last used cell. Blank rows and cells inside that
/// box are kept as empty cells.
fn parse_sheet(xml: &[u8], shared: &[String]) -> Result<Grid> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut origin: Option<CellRef> = None;
    let mut cells: Vec<(CellRef, CellValue)> = Vec::new();
    let mut next_row: u32 = 0;
    let mut row: u32 = 0;
    let mut next_col: u32 = 0;
    let mut pending: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_inline_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"dimension" => origin = dimension_origin(&e)?,
                b"row" => {
                    row = row_index(&e, next_row)?;
                    next_row = row + 1;
                    next_col = 0;
                }
                b"c" => {
                    let at = cell_position(&e, row, next_col)?;
                    next_col = at.col + 1;
                    pending = Some(PendingCell {
                        at: Some(at),
                        cell_type: attr(&e, b"t")?,
                        ..Default::default()
                    });
                }
                b"v" => in_value = true,
                b"rPh" => in_phonetic = true,
                b"t" if !in_phonetic => in_inline_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"dimension" => origin = dimension_origin(&e)?,
                b"row" => {
                    row = row_index(&e, next_row)?;
                    next_row = row + 1;
                    next_col = 0;
                }
                b"c" => {
                    // Styled but valueless cell
                    next_col = cell_position(&e, row, next_col)?.col + 1;
                }
                _ => {}
            },
            Event::Text(t) => {
                if let Some(cell) = pending.as_mut() {
                    if in_value {
                        cell.value.push_str(&t.unescape()?);
                    } else if in_inline_text {
                        cell.inline.push_str(&t.unescape()?);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" => in_value = false,
                b"t" => in_inline_text = false,
                b"rPh" => in_phonetic = false,
                b"c" => {
                    if let Some(mut cell) = pending.take() {
                        let at = cell.at.take();
                        let value = cell.resolve(shared);
                        if let (Some(at), false) = (at, value.is_empty()) {
                            cells.push((at, value));
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    build_grid(origin, cells)
}

fn dimension_origin(e: &BytesStart) -> Result<Option<CellRef>> {
    let Some(range) = attr(e, b"ref")? else {
        return Ok(None);
    };
    match CellRef::parse_range(&range) {
        Ok((start, _)) => Ok(Some(start)),
        Err(err) => {
            log::warn!("Ignoring sheet dimension: {}", err);
            Ok(None)
        }
    }
}

fn row_index(e: &BytesStart, next_row: u32) -> Result<u32> {
    let row = attr(e, b"r")?
        .and_then(|r| r.trim().parse::<u32>().ok())
        .filter(|r| *r > 0)
        .map(|r| r - 1)
        .unwrap_or(next_row);
    if row >= MAX_ROWS {
        return Err(Error::InvalidCellReference(format!("row {}", u64::from(row) + 1)));
    }
    Ok(row)
}

fn cell_position(e: &BytesStart, row: u32, next_col: u32) -> Result<CellRef> {
    match attr(e, b"r")? {
        Some(reference) => CellRef::parse(&reference),
        None if next_col >= MAX_COLUMNS => Err(Error::InvalidCellReference(format!(
            "column {} of row {}",
            u64::from(next_col) + 1,
            u64::from(row) + 1
        ))),
        None => Ok(CellRef::new(row, next_col)),
    }
}

fn build_grid(origin: Option<CellRef>, cells: Vec<(CellRef, CellValue)>) -> Result<Grid> {
    if cells.is_empty() {
        return Ok(Grid::new());
    }

    let min_row = cells.iter().map(|(at, _)| at.row).min().unwrap_or(0);
    let min_col = cells.iter().map(|(at, _)| at.col).min().unwrap_or(0);
    let max_row = cells.iter().map(|(at, _)| at.row).max().unwrap_or(0);
    let max_col = cells.iter().map(|(at, _)| at.col).max().unwrap_or(0);

    let (top, left) = match origin {
        Some(o) => (o.row.min(min_row), o.col.min(min_col)),
        None => (min_row, min_col),
    };

    let height = u64::from(max_row - top) + 1;
    let width = u64::from(max_col - left) + 1;
    if height * width > MAX_GRID_CELLS {
        return Err(Error::SheetTooLarge {
            rows: height,
            columns: width,
            limit: MAX_GRID_CELLS,
        });
    }

    let mut rows = vec![vec![CellValue::Empty; width as usize]; height as usize];
    for (at, value) in cells {
        rows[(at.row - top) as usize][(at.col - left) as usize] = value;
    }

    Ok(Grid::from_rows(rows))
}
