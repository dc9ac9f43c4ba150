//! In-memory OOXML fixtures shared by the integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const SHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Zip the given parts into an archive.
pub fn package(parts: &[(&str, String)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A DOCX whose body is `body`, with `Heading1`..`Heading3` and `Quote`
/// styles and a hyperlink relationship `rIdLink`.
pub fn docx(body: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{WORD_NS}" xmlns:r="{REL_NS}"><w:body>{body}</w:body></w:document>"#
    );
    let styles = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{WORD_NS}">
  <w:style w:type="paragraph" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/></w:style>
  <w:style w:type="paragraph" w:styleId="Quote"><w:name w:val="Quote"/></w:style>
</w:styles>"#
    );
    let rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{PKG_REL_NS}">
  <Relationship Id="rId1" Type="{REL_NS}/styles" Target="styles.xml"/>
  <Relationship Id="rIdLink" Type="{REL_NS}/hyperlink" Target="https://example.org/a?b=1&amp;c=2" TargetMode="External"/>
</Relationships>"#
    );

    package(&[
        ("word/document.xml", document),
        ("word/styles.xml", styles),
        ("word/_rels/document.xml.rels", rels),
    ])
}

/// A paragraph with an optional style id.
pub fn paragraph(style: Option<&str>, text: &str) -> String {
    let props = style
        .map(|s| format!(r#"<w:pPr><w:pStyle w:val="{s}"/></w:pPr>"#))
        .unwrap_or_default();
    format!(r#"<w:p>{props}<w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
}

/// An XLSX with one worksheet per entry. Every string cell goes through the
/// shared strings table.
pub fn xlsx(sheets: &[(&str, Vec<Vec<Cell>>)]) -> Vec<u8> {
    let mut shared: Vec<String> = Vec::new();
    let mut parts: Vec<(String, String)> = Vec::new();

    let mut sheet_entries = String::new();
    let mut rel_entries = String::new();
    for (index, (name, rows)) in sheets.iter().enumerate() {
        let n = index + 1;
        sheet_entries.push_str(&format!(
            r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#
        ));
        rel_entries.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));
        parts.push((
            format!("xl/worksheets/sheet{n}.xml"),
            worksheet(rows, &mut shared),
        ));
    }

    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{SHEET_NS}" xmlns:r="{REL_NS}"><sheets>{sheet_entries}</sheets></workbook>"#
    );
    let rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{PKG_REL_NS}">{rel_entries}</Relationships>"#
    );
    let strings: String = shared
        .iter()
        .map(|s| format!("<si><t>{s}</t></si>"))
        .collect();
    let shared_strings = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="{SHEET_NS}" count="{0}" uniqueCount="{0}">{strings}</sst>"#,
        shared.len()
    );

    let mut all = vec![
        ("xl/workbook.xml".to_string(), workbook),
        ("xl/_rels/workbook.xml.rels".to_string(), rels),
        ("xl/sharedStrings.xml".to_string(), shared_strings),
    ];
    all.extend(parts);

    let borrowed: Vec<(&str, String)> = all
        .iter()
        .map(|(name, content)| (name.as_str(), content.clone()))
        .collect();
    package(&borrowed)
}

/// A single-sheet XLSX whose worksheet holds `body` verbatim (dimension,
/// sheet data) and no shared strings.
pub fn raw_xlsx(body: &str) -> Vec<u8> {
    let workbook = format!(
        r#"<workbook xmlns="{SHEET_NS}" xmlns:r="{REL_NS}"><sheets><sheet name="Raw" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    );
    let rels = format!(
        r#"<Relationships xmlns="{PKG_REL_NS}"><Relationship Id="rId1" Type="{REL_NS}/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#
    );
    let sheet = format!(r#"<worksheet xmlns="{SHEET_NS}">{body}</worksheet>"#);

    package(&[
        ("xl/workbook.xml", workbook),
        ("xl/_rels/workbook.xml.rels", rels),
        ("xl/worksheets/sheet1.xml", sheet),
    ])
}

/// A single-sheet XLSX of `rows` rows: a label column and a number column.
pub fn numbered_xlsx(rows: usize) -> Vec<u8> {
    let grid = (1..=rows)
        .map(|i| vec![Cell::Text(format!("row {i}")), Cell::Number(i as f64)])
        .collect();
    xlsx(&[("Data", grid)])
}

/// A fixture cell.
#[derive(Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
    Blank,
}

fn worksheet(rows: &[Vec<Cell>], shared: &mut Vec<String>) -> String {
    let mut data = String::new();
    for (r, row) in rows.iter().enumerate() {
        let row_number = r + 1;
        data.push_str(&format!(r#"<row r="{row_number}">"#));
        for (c, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_letter(c), row_number);
            match cell {
                Cell::Text(s) => {
                    shared.push(s.clone());
                    data.push_str(&format!(
                        r#"<c r="{reference}" t="s"><v>{}</v></c>"#,
                        shared.len() - 1
                    ));
                }
                Cell::Number(n) => {
                    data.push_str(&format!(r#"<c r="{reference}"><v>{n}</v></c>"#));
                }
                Cell::Bool(b) => {
                    data.push_str(&format!(
                        r#"<c r="{reference}" t="b"><v>{}</v></c>"#,
                        u8::from(*b)
                    ));
                }
                Cell::Blank => {}
            }
        }
        data.push_str("</row>");
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{SHEET_NS}"><sheetData>{data}</sheetData></worksheet>"#
    )
}

fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut name = String::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    name
}
