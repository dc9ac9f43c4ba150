//! DOCX to HTML conversion.

use super::package::{attr, resolve_target, Package, Relationship};
use super::style_map::StyleMap;
use super::RichTextConverter;
use crate::error::Result;
use html_escape::{encode_double_quoted_attribute, encode_text};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

/// Converts Word documents to HTML.
///
/// Paragraph styles are mapped through a [`StyleMap`]; unmapped paragraphs
/// become `<p>`. Bold, italic, strikethrough, superscript and subscript runs
/// become `strong`, `em`, `s`, `sup` and `sub`. Tables, hyperlinks and line
/// breaks are kept. Empty paragraphs are dropped.
#[derive(Debug, Clone, Default)]
pub struct DocxConverter {
    _private: (),
}

impl DocxConverter {
    /// Create a new DOCX converter.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl RichTextConverter for DocxConverter {
    fn name(&self) -> &str {
        "docx"
    }

    fn convert(&self, bytes: &[u8], style_map: &StyleMap) -> Result<String> {
        let mut package = Package::open(bytes)?;
        let document = package.read_part(DOCUMENT_PART)?;
        let styles = match package.read_optional(STYLES_PART)? {
            Some(xml) => parse_style_names(&xml)?,
            None => HashMap::new(),
        };
        let links = hyperlink_targets(package.relationships(DOCUMENT_RELS_PART)?);
        log::debug!(
            "Converting DOCX: {} named styles, {} hyperlinks",
            styles.len(),
            links.len()
        );

        let mut writer = HtmlWriter::new(&styles, &links, style_map);
        let mut reader = Reader::from_reader(&document[..]);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => writer.start(&e)?,
                Event::Empty(e) => {
                    writer.start(&e)?;
                    writer.end(e.local_name().as_ref());
                }
                Event::End(e) => writer.end(e.local_name().as_ref()),
                Event::Text(t) => writer.text(&t.unescape()?),
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(writer.finish())
    }
}

/// Map style ids to display names from `word/styles.xml`.
fn parse_style_names(xml: &[u8]) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut names = HashMap::new();
    let mut current_id: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"style" => {
                current_id = attr(&e, b"styleId")?;
            }
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"name" => {
                if let (Some(id), Some(name)) = (current_id.as_ref(), attr(&e, b"val")?) {
                    names.insert(id.clone(), name);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"style" => current_id = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(names)
}

fn hyperlink_targets(rels: HashMap<String, Relationship>) -> HashMap<String, String> {
    rels.into_iter()
        .filter(|(_, rel)| rel.rel_type.ends_with("/hyperlink"))
        .map(|(id, rel)| {
            let target = if rel.external {
                rel.target
            } else {
                resolve_target("word", &rel.target)
            };
            (id, target)
        })
        .collect()
}

/// A finished block inside a container (body or table cell).
enum Block {
    Element {
        tag: String,
        inner: String,
        // Rule style name for non-fresh merging
        merge_key: Option<String>,
    },
    Raw(String),
}

#[derive(Default)]
struct Container {
    blocks: Vec<Block>,
    colspan: u32,
}

impl Container {
    fn push_element(&mut self, tag: String, inner: String, merge_key: Option<String>) {
        if let (Some(key), Some(Block::Element {
            tag: last_tag,
            inner: last_inner,
            merge_key: Some(last_key),
        })) = (merge_key.as_ref(), self.blocks.last_mut())
        {
            if last_key == key && *last_tag == tag {
                last_inner.push_str(&inner);
                return;
            }
        }
        self.blocks.push(Block::Element {
            tag,
            inner,
            merge_key,
        });
    }

    fn render(self) -> String {
        let mut html = String::new();
        for block in self.blocks {
            match block {
                Block::Element { tag, inner, .. } => {
                    html.push_str(&format!("<{}>{}</{}>", tag, inner, tag));
                }
                Block::Raw(raw) => html.push_str(&raw),
            }
        }
        html
    }
}

#[derive(Default)]
struct TableBuilder {
    rows: Vec<String>,
    current_row: Option<String>,
}

#[derive(Default)]
struct ParagraphBuilder {
    style_id: Option<String>,
    inner: String,
}

#[derive(Default)]
struct RunBuilder {
    bold: bool,
    italic: bool,
    strike: bool,
    vert_align: Option<&'static str>,
    style_id: Option<String>,
    html: String,
}

struct HtmlWriter<'a> {
    styles: &'a HashMap<String, String>,
    links: &'a HashMap<String, String>,
    style_map: &'a StyleMap,
    containers: Vec<Container>,
    tables: Vec<TableBuilder>,
    paragraph: Option<ParagraphBuilder>,
    run: Option<RunBuilder>,
    link: Option<(String, String)>,
    in_paragraph_props: bool,
    in_run_props: bool,
    in_text: bool,
    skip_depth: usize,
}

impl<'a> HtmlWriter<'a> {
    fn new(
        styles: &'a HashMap<String, String>,
        links: &'a HashMap<String, String>,
        style_map: &'a StyleMap,
    ) -> Self {
        Self {
            styles,
            links,
            style_map,
            containers: vec![Container::default()],
            tables: Vec::new(),
            paragraph: None,
            run: None,
            link: None,
            in_paragraph_props: false,
            in_run_props: false,
            in_text: false,
            skip_depth: 0,
        }
    }

    fn start(&mut self, e: &BytesStart) -> Result<()> {
        if self.skip_depth > 0 {
            self.skip_depth += 1;
            return Ok(());
        }

        match e.local_name().as_ref() {
            // Drawings, text boxes and deleted revisions are not part of the flow
            b"txbxContent" | b"drawing" | b"pict" | b"object" | b"del" => self.skip_depth = 1,
            b"p" => self.paragraph = Some(ParagraphBuilder::default()),
            b"pPr" => self.in_paragraph_props = true,
            b"pStyle" if self.in_paragraph_props => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.style_id = attr(e, b"val")?;
                }
            }
            b"r" => self.run = Some(RunBuilder::default()),
            b"rPr" if !self.in_paragraph_props => self.in_run_props = true,
            b"b" | b"i" | b"strike" | b"dstrike" | b"vertAlign" | b"rStyle"
                if self.in_run_props =>
            {
                self.run_property(e)?;
            }
            b"t" => self.in_text = true,
            b"tab" if !self.in_paragraph_props => self.push_run_html("\t"),
            b"br" | b"cr" => self.push_run_html("<br />"),
            b"hyperlink" => {
                let href = match attr(e, b"id")? {
                    Some(id) => self.links.get(&id).cloned(),
                    None => attr(e, b"anchor")?.map(|anchor| format!("#{}", anchor)),
                };
                self.link = href.map(|href| (href, String::new()));
            }
            b"tbl" => self.tables.push(TableBuilder::default()),
            b"tr" => {
                if let Some(table) = self.tables.last_mut() {
                    table.current_row = Some(String::new());
                }
            }
            b"tc" => self.containers.push(Container::default()),
            b"gridSpan" => {
                let span = attr(e, b"val")?
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(1);
                if let Some(cell) = self.containers.last_mut() {
                    cell.colspan = span;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, local: &[u8]) {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return;
        }

        match local {
            b"p" => self.finish_paragraph(),
            b"pPr" => self.in_paragraph_props = false,
            b"rPr" => self.in_run_props = false,
            b"t" => self.in_text = false,
            b"r" => self.finish_run(),
            b"hyperlink" => {
                if let Some((href, inner)) = self.link.take() {
                    if !inner.is_empty() {
                        let anchor = format!(
                            "<a href=\"{}\">{}</a>",
                            encode_double_quoted_attribute(&href),
                            inner
                        );
                        self.push_paragraph_html(&anchor);
                    }
                }
            }
            b"tc" => {
                // The body container is never popped
                if self.containers.len() > 1 {
                    if let Some(cell) = self.containers.pop() {
                        let colspan = cell.colspan;
                        let html = cell.render();
                        if let Some(row) = self
                            .tables
                            .last_mut()
                            .and_then(|t| t.current_row.as_mut())
                        {
                            if colspan > 1 {
                                row.push_str(&format!("<td colspan=\"{}\">", colspan));
                            } else {
                                row.push_str("<td>");
                            }
                            row.push_str(&html);
                            row.push_str("</td>");
                        }
                    }
                }
            }
            b"tr" => {
                if let Some(table) = self.tables.last_mut() {
                    if let Some(row) = table.current_row.take() {
                        table.rows.push(row);
                    }
                }
            }
            b"tbl" => {
                if let Some(table) = self.tables.pop() {
                    let mut html = String::from("<table>");
                    for row in table.rows {
                        html.push_str("<tr>");
                        html.push_str(&row);
                        html.push_str("</tr>");
                    }
                    html.push_str("</table>");
                    self.current_container().blocks.push(Block::Raw(html));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.skip_depth == 0 && self.in_text {
            self.push_run_html(&encode_text(text));
        }
    }

    fn finish(mut self) -> String {
        // Unclosed containers only occur in malformed input
        while self.containers.len() > 1 {
            if let Some(cell) = self.containers.pop() {
                let html = cell.render();
                self.current_container().blocks.push(Block::Raw(html));
            }
        }
        self.containers.pop().map(Container::render).unwrap_or_default()
    }

    fn run_property(&mut self, e: &BytesStart) -> Result<()> {
        let val = attr(e, b"val")?;
        let Some(run) = self.run.as_mut() else {
            return Ok(());
        };
        let enabled = !matches!(val.as_deref(), Some("0") | Some("false") | Some("none"));

        match e.local_name().as_ref() {
            b"b" => run.bold = enabled,
            b"i" => run.italic = enabled,
            b"strike" | b"dstrike" => run.strike = enabled,
            b"vertAlign" => {
                run.vert_align = match val.as_deref() {
                    Some("superscript") => Some("sup"),
                    Some("subscript") => Some("sub"),
                    _ => None,
                }
            }
            b"rStyle" => run.style_id = val,
            _ => {}
        }
        Ok(())
    }

    fn push_run_html(&mut self, html: &str) {
        match self.run.as_mut() {
            Some(run) => run.html.push_str(html),
            None => self.push_paragraph_html(html),
        }
    }

    fn push_paragraph_html(&mut self, html: &str) {
        if let Some((_, inner)) = self.link.as_mut() {
            inner.push_str(html);
        } else if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.inner.push_str(html);
        }
    }

    fn finish_run(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        if run.html.is_empty() {
            return;
        }

        let mut html = run.html;
        if let Some(tag) = run.vert_align {
            html = wrap(tag, &html);
        }
        if run.strike {
            html = wrap("s", &html);
        }
        if run.italic {
            html = wrap("em", &html);
        }
        if run.bold {
            html = wrap("strong", &html);
        }
        if let Some(rule) = run
            .style_id
            .as_deref()
            .and_then(|id| self.style_map.run_rule(self.style_name(id)))
        {
            html = wrap(&rule.tag, &html);
        }

        self.push_paragraph_html(&html);
    }

    fn finish_paragraph(&mut self) {
        let Some(paragraph) = self.paragraph.take() else {
            return;
        };
        if paragraph.inner.trim().is_empty() {
            return;
        }

        let rule = paragraph
            .style_id
            .as_deref()
            .and_then(|id| self.style_map.paragraph_rule(self.style_name(id)));

        let (tag, merge_key) = match rule {
            Some(rule) if rule.fresh => (rule.tag.clone(), None),
            Some(rule) => (rule.tag.clone(), Some(rule.style_name.to_ascii_lowercase())),
            None => ("p".to_string(), None),
        };
        self.current_container()
            .push_element(tag, paragraph.inner, merge_key);
    }

    /// Display name of a style id; unknown ids are used as names.
    fn style_name<'s>(&'s self, id: &'s str) -> &'s str {
        self.styles.get(id).map(String::as_str).unwrap_or(id)
    }

    fn current_container(&mut self) -> &mut Container {
        if self.containers.is_empty() {
            self.containers.push(Container::default());
        }
        let last = self.containers.len() - 1;
        &mut self.containers[last]
    }
}

fn wrap(tag: &str, inner: &str) -> String {
    format!("<{}>{}</{}>", tag, inner, tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert_body(body: &str, styles: &HashMap<String, String>, map: &StyleMap) -> String {
        let xml = format!(
            "<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\" \
             xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
             <w:body>{}</w:body></w:document>",
            body
        );
        let links = HashMap::from([("rId9".to_string(), "https://example.com".to_string())]);
        let mut writer = HtmlWriter::new(styles, &links, map);
        let mut reader = Reader::from_reader(xml.as_bytes());
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf).unwrap() {
                Event::Start(e) => writer.start(&e).unwrap(),
                Event::Empty(e) => {
                    writer.start(&e).unwrap();
                    writer.end(e.local_name().as_ref());
                }
                Event::End(e) => writer.end(e.local_name().as_ref()),
                Event::Text(t) => writer.text(&t.unescape().unwrap()),
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        writer.finish()
    }

    fn heading_styles() -> HashMap<String, String> {
        HashMap::from([
            ("Heading1".to_string(), "heading 1".to_string()),
            ("Heading2".to_string(), "heading 2".to_string()),
            ("Quote".to_string(), "Quote".to_string()),
        ])
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let html = convert_body(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Title</w:t></w:r></w:p>
               <w:p><w:r><w:t>Body &amp; more</w:t></w:r></w:p>
               <w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr><w:r><w:t>Sub</w:t></w:r></w:p>"#,
            &heading_styles(),
            &StyleMap::default_headings(),
        );
        assert_eq!(html, "<h1>Title</h1><p>Body &amp; more</p><h2>Sub</h2>");
    }

    #[test]
    fn test_fresh_headings_do_not_merge() {
        let html = convert_body(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>A</w:t></w:r></w:p>
               <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>B</w:t></w:r></w:p>"#,
            &heading_styles(),
            &StyleMap::default_headings(),
        );
        assert_eq!(html, "<h1>A</h1><h1>B</h1>");
    }

    #[test]
    fn test_non_fresh_rules_merge() {
        let map = StyleMap::parse("p[style-name='Quote'] => blockquote").unwrap();
        let html = convert_body(
            r#"<w:p><w:pPr><w:pStyle w:val="Quote"/></w:pPr><w:r><w:t>one </w:t></w:r></w:p>
               <w:p><w:pPr><w:pStyle w:val="Quote"/></w:pPr><w:r><w:t>two</w:t></w:r></w:p>
               <w:p><w:r><w:t>after</w:t></w:r></w:p>"#,
            &heading_styles(),
            &map,
        );
        assert_eq!(html, "<blockquote>one two</blockquote><p>after</p>");
    }

    #[test]
    fn test_unmapped_style_is_paragraph() {
        let html = convert_body(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Plain</w:t></w:r></w:p>"#,
            &heading_styles(),
            &StyleMap::new(),
        );
        assert_eq!(html, "<p>Plain</p>");
    }

    #[test]
    fn test_run_formatting() {
        let html = convert_body(
            r#"<w:p>
                 <w:r><w:rPr><w:b/></w:rPr><w:t>bold</w:t></w:r>
                 <w:r><w:rPr><w:i/><w:b w:val="0"/></w:rPr><w:t>italic</w:t></w:r>
                 <w:r><w:rPr><w:strike/></w:rPr><w:t>gone</w:t></w:r>
                 <w:r><w:rPr><w:vertAlign w:val="superscript"/></w:rPr><w:t>2</w:t></w:r>
               </w:p>"#,
            &HashMap::new(),
            &StyleMap::default_headings(),
        );
        assert_eq!(
            html,
            "<p><strong>bold</strong><em>italic</em><s>gone</s><sup>2</sup></p>"
        );
    }

    #[test]
    fn test_paragraph_mark_formatting_ignored() {
        let html = convert_body(
            r#"<w:p><w:pPr><w:rPr><w:b/></w:rPr></w:pPr><w:r><w:t>plain</w:t></w:r></w:p>"#,
            &HashMap::new(),
            &StyleMap::default_headings(),
        );
        assert_eq!(html, "<p>plain</p>");
    }

    #[test]
    fn test_empty_paragraphs_dropped() {
        let html = convert_body(
            r#"<w:p/><w:p><w:r><w:t>  </w:t></w:r></w:p><w:p><w:r><w:t>x</w:t></w:r></w:p>"#,
            &HashMap::new(),
            &StyleMap::default_headings(),
        );
        assert_eq!(html, "<p>x</p>");
    }

    #[test]
    fn test_breaks_tabs_and_links() {
        let html = convert_body(
            r#"<w:p>
                 <w:r><w:t>a</w:t><w:br/><w:t>b</w:t><w:tab/><w:t>c</w:t></w:r>
                 <w:hyperlink r:id="rId9"><w:r><w:t>site</w:t></w:r></w:hyperlink>
                 <w:hyperlink w:anchor="top"><w:r><w:t>up</w:t></w:r></w:hyperlink>
               </w:p>"#,
            &HashMap::new(),
            &StyleMap::default_headings(),
        );
        assert_eq!(
            html,
            "<p>a<br />b\tc<a href=\"https://example.com\">site</a><a href=\"#top\">up</a></p>"
        );
    }

    #[test]
    fn test_tables() {
        let html = convert_body(
            r#"<w:tbl>
                 <w:tr>
                   <w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>wide</w:t></w:r></w:p></w:tc>
                 </w:tr>
                 <w:tr>
                   <w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc>
                   <w:tc><w:p/></w:tc>
                 </w:tr>
               </w:tbl>
               <w:p><w:r><w:t>after</w:t></w:r></w:p>"#,
            &HashMap::new(),
            &StyleMap::default_headings(),
        );
        assert_eq!(
            html,
            "<table><tr><td colspan=\"2\"><p>wide</p></td></tr>\
             <tr><td><p>a</p></td><td></td></tr></table><p>after</p>"
        );
    }

    #[test]
    fn test_text_boxes_and_deletions_skipped() {
        let html = convert_body(
            r#"<w:p>
                 <w:r><w:t>kept</w:t></w:r>
                 <w:del><w:r><w:delText>removed</w:delText></w:r></w:del>
                 <w:r><w:pict><w:txbxContent><w:p><w:r><w:t>boxed</w:t></w:r></w:p></w:txbxContent></w:pict></w:r>
               </w:p>"#,
            &HashMap::new(),
            &StyleMap::default_headings(),
        );
        assert_eq!(html, "<p>kept</p>");
    }

    #[test]
    fn test_run_style_rule() {
        let styles = HashMap::from([("Emph".to_string(), "Emphasis".to_string())]);
        let map = StyleMap::parse("r[style-name='Emphasis'] => mark").unwrap();
        let html = convert_body(
            r#"<w:p><w:r><w:rPr><w:rStyle w:val="Emph"/></w:rPr><w:t>hi</w:t></w:r></w:p>"#,
            &styles,
            &map,
        );
        assert_eq!(html, "<p><mark>hi</mark></p>");
    }

    #[test]
    fn test_parse_style_names() {
        let xml = br#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
  <w:style w:type="character" w:styleId="Strong"><w:name w:val="Strong"/></w:style>
</w:styles>"#;
        let names = parse_style_names(xml).unwrap();
        assert_eq!(names["Heading1"], "heading 1");
        assert_eq!(names["Strong"], "Strong");
    }
}
