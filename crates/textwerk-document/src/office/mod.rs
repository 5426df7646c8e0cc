// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Office containers — PPTX and DOCX readers.
//
// Both formats are zip archives of XML parts linked by relationship files.
// The readers here expose just what the extractors consume: native slide
// text, and word-processor body text with inline image placeholders plus the
// embedded images themselves.

pub mod docx;
pub mod pptx;

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::events::Event;
use textwerk_core::error::{Result, TextwerkError};
use zip::ZipArchive;

pub use docx::DocxReader;
pub use pptx::PptxReader;

/// One slide: the text of each text-bearing top-level shape, in z-order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slide {
    pub shapes: Vec<String>,
}

/// Slide-deck parsing capability.
pub trait SlideSource: Send + Sync {
    /// Slides in presentation order.
    fn slides(&self, path: &Path) -> Result<Vec<Slide>>;
}

/// An image extracted from a word-processor container into scratch space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedAsset {
    /// File name used in the inline placeholder token.
    pub name: String,
    /// Where the bytes were written.
    pub path: PathBuf,
}

/// Body text with inline placeholders, plus the extracted assets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordContent {
    pub body: String,
    pub assets: Vec<EmbeddedAsset>,
}

/// Word-processor parsing capability.
pub trait WordSource: Send + Sync {
    /// Read the body and write every embedded asset into `scratch` under a
    /// deterministic name.
    fn read(&self, path: &Path, scratch: &Path) -> Result<WordContent>;
}

impl<T: SlideSource + ?Sized> SlideSource for Box<T> {
    fn slides(&self, path: &Path) -> Result<Vec<Slide>> {
        (**self).slides(path)
    }
}

impl<T: WordSource + ?Sized> WordSource for Box<T> {
    fn read(&self, path: &Path, scratch: &Path) -> Result<WordContent> {
        (**self).read(path, scratch)
    }
}

/// Inline token marking where an embedded image occurred.
pub fn placeholder(asset_name: &str) -> String {
    format!("[image:{asset_name}]")
}

// -- Archive helpers ----------------------------------------------------------

pub(crate) fn open_archive(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path)?;
    ZipArchive::new(file).map_err(|err| {
        TextwerkError::ContainerParse(format!("{} is not a valid archive: {}", path.display(), err))
    })
}

pub(crate) fn read_part(archive: &mut ZipArchive<File>, name: &str) -> Result<String> {
    let mut entry = archive.by_name(name).map_err(|err| {
        TextwerkError::ContainerParse(format!("missing part {}: {}", name, err))
    })?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml).map_err(|err| {
        TextwerkError::ContainerParse(format!("cannot read part {}: {}", name, err))
    })?;
    Ok(xml)
}

pub(crate) fn xml_error(part: &str, err: impl std::fmt::Display) -> TextwerkError {
    TextwerkError::ContainerParse(format!("malformed XML in {}: {}", part, err))
}

/// Relationship id → target, from a `.rels` part.
pub(crate) fn parse_relationships(xml: &str, part: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut relationships = HashMap::new();

    loop {
        match reader.read_event().map_err(|err| xml_error(part, err))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = e.try_get_attribute("Id").map_err(|err| xml_error(part, err))?;
                let target = e.try_get_attribute("Target").map_err(|err| xml_error(part, err))?;
                if let (Some(id), Some(target)) = (id, target) {
                    let id = id.unescape_value().map_err(|err| xml_error(part, err))?;
                    let target = target.unescape_value().map_err(|err| xml_error(part, err))?;
                    relationships.insert(id.into_owned(), target.into_owned());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(relationships)
}

/// Resolve a relationship target against the directory of its source part.
///
/// `resolve_target("ppt", "slides/slide1.xml")` is `ppt/slides/slide1.xml`;
/// absolute targets (leading `/`) are archive-rooted.
pub(crate) fn resolve_target(base_dir: &str, target: &str) -> String {
    let mut segments: Vec<&str> = if target.starts_with('/') {
        Vec::new()
    } else {
        base_dir.split('/').filter(|s| !s.is_empty()).collect()
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Last path component of an archive entry name.
pub(crate) fn basename(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}
