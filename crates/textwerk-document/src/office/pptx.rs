// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PPTX reader — native text of every text-bearing shape, slide by slide.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use textwerk_core::error::{Result, TextwerkError};
use tracing::{debug, info, instrument};

use super::{Slide, SlideSource, open_archive, parse_relationships, read_part, resolve_target, xml_error};

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// Reads slide text straight from the PPTX XML parts. No OCR is involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct PptxReader;

impl PptxReader {
    pub fn new() -> Self {
        Self
    }
}

impl SlideSource for PptxReader {
    #[instrument(skip_all, fields(path = %path.display()))]
    fn slides(&self, path: &Path) -> Result<Vec<Slide>> {
        let mut archive = open_archive(path)?;

        let presentation = read_part(&mut archive, PRESENTATION_PART)?;
        let rels_xml = read_part(&mut archive, PRESENTATION_RELS)?;
        let relationships = parse_relationships(&rels_xml, PRESENTATION_RELS)?;

        let mut slides = Vec::new();
        for rel_id in slide_order(&presentation)? {
            let target = relationships.get(&rel_id).ok_or_else(|| {
                TextwerkError::ContainerParse(format!(
                    "slide relationship {} has no target",
                    rel_id
                ))
            })?;
            let part = resolve_target("ppt", target);
            let xml = read_part(&mut archive, &part)?;
            let slide = parse_slide(&xml, &part)?;
            debug!(part = %part, shapes = slide.shapes.len(), "Slide parsed");
            slides.push(slide);
        }

        info!(slides = slides.len(), "Slide deck read");
        Ok(slides)
    }
}

/// Relationship ids of `p:sldId` entries, in presentation order.
fn slide_order(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();

    loop {
        match reader
            .read_event()
            .map_err(|err| xml_error(PRESENTATION_PART, err))?
        {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"p:sldId" => {
                if let Some(attr) = e
                    .try_get_attribute("r:id")
                    .map_err(|err| xml_error(PRESENTATION_PART, err))?
                {
                    let id = attr
                        .unescape_value()
                        .map_err(|err| xml_error(PRESENTATION_PART, err))?;
                    ids.push(id.into_owned());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(ids)
}

/// Collect the text of top-level `p:sp` shapes that carry a text body.
///
/// Paragraphs inside one shape are joined with `\n`; line breaks become
/// `\n` as well. Shapes nested in group shapes are not part of the slide's
/// top-level shape list and are skipped. Empty shape text is dropped.
fn parse_slide(xml: &str, part: &str) -> Result<Slide> {
    let mut reader = Reader::from_str(xml);
    let mut slide = Slide::default();

    let mut group_depth = 0usize;
    let mut shape: Option<ShapeText> = None;
    let mut in_text_run = false;

    loop {
        match reader.read_event().map_err(|err| xml_error(part, err))? {
            Event::Start(e) => match e.name().as_ref() {
                b"p:grpSp" => group_depth += 1,
                b"p:sp" if group_depth == 0 => shape = Some(ShapeText::default()),
                b"p:txBody" => {
                    if let Some(shape) = shape.as_mut() {
                        shape.has_text_body = true;
                    }
                }
                b"a:p" => {
                    if let Some(shape) = shape.as_mut() {
                        shape.paragraphs.push(String::new());
                    }
                }
                b"a:t" => in_text_run = true,
                _ => {}
            },
            Event::Empty(e) => {
                if e.name().as_ref() == b"a:br"
                    && let Some(current) = shape.as_mut().and_then(|s| s.paragraphs.last_mut())
                {
                    current.push('\n');
                }
            }
            Event::Text(t) if in_text_run => {
                if let Some(current) = shape.as_mut().and_then(|s| s.paragraphs.last_mut()) {
                    let text = t.unescape().map_err(|err| xml_error(part, err))?;
                    current.push_str(&text);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"p:grpSp" => group_depth = group_depth.saturating_sub(1),
                b"a:t" => in_text_run = false,
                b"p:sp" if group_depth == 0 => {
                    if let Some(done) = shape.take()
                        && let Some(text) = done.into_text()
                    {
                        slide.shapes.push(text);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(slide)
}

#[derive(Debug, Default)]
struct ShapeText {
    has_text_body: bool,
    paragraphs: Vec<String>,
}

impl ShapeText {
    fn into_text(self) -> Option<String> {
        if !self.has_text_body {
            return None;
        }
        let text = self.paragraphs.join("\n");
        if text.is_empty() { None } else { Some(text) }
    }
}
