//! OOXML package access shared by the DOCX and XLSX collaborators.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// Upper bound on the buffer reserved from a part's declared size.
const MAX_PREALLOC: u64 = 1 << 20;

/// A relationship entry from a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub target: String,
    pub rel_type: String,
    pub external: bool,
}

/// Read-only view of an OOXML ZIP package held in memory.
pub(crate) struct Package<'a> {
    archive: zip::ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> Package<'a> {
    /// Open a package from bytes.
    pub fn open(data: &'a [u8]) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(data))?;
        Ok(Self { archive })
    }

    /// Read a part that must exist.
    pub fn read_part(&mut self, name: &str) -> Result<Vec<u8>> {
        self.read_optional(name)?
            .ok_or_else(|| Error::MissingPart(name.to_string()))
    }

    /// Read a part that may be absent.
    pub fn read_optional(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        // Declared sizes are untrusted
        let mut data = Vec::with_capacity(file.size().min(MAX_PREALLOC) as usize);
        file.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    /// Relationships of a part, keyed by id. A missing `.rels` part yields
    /// an empty map.
    pub fn relationships(&mut self, rels_part: &str) -> Result<HashMap<String, Relationship>> {
        match self.read_optional(rels_part)? {
            Some(xml) => parse_relationships(&xml),
            None => Ok(HashMap::new()),
        }
    }
}

fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, Relationship>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = attr(&e, b"Id")?;
                let target = attr(&e, b"Target")?;
                if let (Some(id), Some(target)) = (id, target) {
                    let rel_type = attr(&e, b"Type")?.unwrap_or_default();
                    let external = attr(&e, b"TargetMode")?.as_deref() == Some("External");
                    rels.insert(
                        id,
                        Relationship {
                            target,
                            rel_type,
                            external,
                        },
                    );
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Value of the attribute with the given local name, unescaped.
pub(crate) fn attr(element: &BytesStart, local: &[u8]) -> Result<Option<String>> {
    for attribute in element.attributes() {
        let attribute = attribute?;
        if attribute.key.local_name().as_ref() == local {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Resolve a relationship target against the directory of its source part.
///
/// Absolute targets (`/xl/...`) are taken from the package root; `..`
/// segments are applied.
pub(crate) fn resolve_target(base_dir: &str, target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("{}/{}", base_dir.trim_end_matches('/'), target),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
