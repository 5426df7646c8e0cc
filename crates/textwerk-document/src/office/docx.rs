// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DOCX reader: header, body and footer text with `[image:<name>]` tokens
// where pictures sit, plus every file under `word/media/` extracted into
// scratch space.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use textwerk_core::error::{Result, TextwerkError};
use tracing::{debug, info, instrument};
use zip::ZipArchive;

use super::{
    EmbeddedAsset, WordContent, WordSource, basename, open_archive, parse_relationships, placeholder,
    read_part, resolve_target, xml_error,
};

const DOCUMENT_PART: &str = "word/document.xml";
const MEDIA_PREFIX: &str = "word/media/";

#[derive(Debug, Clone, Copy, Default)]
pub struct DocxReader;

impl DocxReader {
    pub fn new() -> Self {
        Self
    }
}

impl WordSource for DocxReader {
    #[instrument(skip_all, fields(path = %path.display()))]
    fn read(&self, path: &Path, scratch: &Path) -> Result<WordContent> {
        let mut archive = open_archive(path)?;

        let headers = numbered_parts(&archive, "header");
        let footers = numbered_parts(&archive, "footer");

        // The main part is mandatory; headers and footers are optional.
        let mut sections = Vec::with_capacity(headers.len() + footers.len() + 1);
        for part in &headers {
            sections.push(read_text_part(&mut archive, part)?);
        }
        sections.push(read_text_part(&mut archive, DOCUMENT_PART)?);
        for part in &footers {
            sections.push(read_text_part(&mut archive, part)?);
        }

        let body = sections
            .into_iter()
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let assets = extract_media(&mut archive, scratch)?;

        info!(
            chars = body.len(),
            headers = headers.len(),
            footers = footers.len(),
            assets = assets.len(),
            "Word document read"
        );
        Ok(WordContent { body, assets })
    }
}

/// `word/<kind>N.xml` parts in numeric order (`header1`, `header2`, `header10`).
fn numbered_parts(archive: &ZipArchive<File>, kind: &str) -> Vec<String> {
    let prefix = format!("word/{kind}");
    let mut parts: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let digits = name.strip_prefix(&prefix)?.strip_suffix(".xml")?;
            if !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            Some((digits.parse().unwrap_or(0), name.to_owned()))
        })
        .collect();
    parts.sort();
    parts.into_iter().map(|(_, name)| name).collect()
}

/// Read one story part and flatten it, resolving pictures through the
/// part's own relationships file.
fn read_text_part(archive: &mut ZipArchive<File>, part: &str) -> Result<String> {
    let xml = read_part(archive, part)?;
    let rels_part = rels_part_for(part);
    // A part without pictures may legitimately lack a rels part.
    let relationships = match read_part(archive, &rels_part) {
        Ok(rels) => parse_relationships(&rels, &rels_part)?,
        Err(_) => HashMap::new(),
    };

    let image_names: HashMap<String, String> = relationships
        .into_iter()
        .map(|(id, target)| {
            let resolved = resolve_target("word", &target);
            (id, basename(&resolved).to_owned())
        })
        .collect();

    parse_body(&xml, part, &image_names)
}

/// `word/header1.xml` → `word/_rels/header1.xml.rels`.
fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Flatten a WordprocessingML story part into plain text.
///
/// Paragraphs are separated by `\n`; `w:tab` becomes `\t` and `w:br`/`w:cr`
/// become `\n`. Pictures (`a:blip r:embed`, legacy `v:imagedata r:id`) become
/// placeholder tokens named after the media file their relationship targets.
fn parse_body(xml: &str, part: &str, image_names: &HashMap<String, String>) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut in_text = false;
    let mut in_tab_stops = false;

    loop {
        match reader.read_event().map_err(|err| xml_error(part, err))? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                b"w:t" => in_text = true,
                b"w:tabs" => in_tab_stops = true,
                _ => inline_token(&e, part, in_tab_stops, image_names, &mut paragraphs)?,
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                _ => inline_token(&e, part, in_tab_stops, image_names, &mut paragraphs)?,
            },
            Event::Text(t) if in_text => {
                let text = t.unescape().map_err(|err| xml_error(part, err))?;
                current(&mut paragraphs).push_str(&text);
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:tabs" => in_tab_stops = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

fn inline_token(
    element: &BytesStart<'_>,
    part: &str,
    in_tab_stops: bool,
    image_names: &HashMap<String, String>,
    paragraphs: &mut Vec<String>,
) -> Result<()> {
    let reference_attr = match element.name().as_ref() {
        b"w:tab" if !in_tab_stops => {
            current(paragraphs).push('\t');
            return Ok(());
        }
        b"w:br" | b"w:cr" => {
            current(paragraphs).push('\n');
            return Ok(());
        }
        b"a:blip" => "r:embed",
        b"v:imagedata" => "r:id",
        _ => return Ok(()),
    };

    let Some(attr) = element
        .try_get_attribute(reference_attr)
        .map_err(|err| xml_error(part, err))?
    else {
        return Ok(());
    };
    let rel_id = attr.unescape_value().map_err(|err| xml_error(part, err))?;

    match image_names.get(&*rel_id) {
        Some(name) => current(paragraphs).push_str(&placeholder(name)),
        None => debug!(part, rel_id = %rel_id, "Picture relationship has no target"),
    }
    Ok(())
}

fn current(paragraphs: &mut Vec<String>) -> &mut String {
    if paragraphs.is_empty() {
        paragraphs.push(String::new());
    }
    let last = paragraphs.len() - 1;
    &mut paragraphs[last]
}

/// Copy every `word/media/*` entry into `scratch/<basename>`, sorted by name.
fn extract_media(archive: &mut ZipArchive<File>, scratch: &Path) -> Result<Vec<EmbeddedAsset>> {
    let mut media: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with(MEDIA_PREFIX) && !name.ends_with('/'))
        .map(str::to_owned)
        .collect();
    media.sort();

    let mut assets = Vec::with_capacity(media.len());
    for entry_name in media {
        let name = basename(&entry_name).to_owned();
        let target = scratch.join(&name);

        let mut entry = archive.by_name(&entry_name).map_err(|err| {
            TextwerkError::ContainerParse(format!("cannot open {}: {}", entry_name, err))
        })?;
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;

        debug!(asset = %name, bytes = entry.size(), "Embedded asset extracted");
        assets.push(EmbeddedAsset { name, path: target });
    }
    Ok(assets)
}
