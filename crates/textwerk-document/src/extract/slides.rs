// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Slide-deck extractor. Slide text is read natively; nothing is recognised.

use std::path::{Path, PathBuf};

use textwerk_core::error::Result;
use textwerk_core::{CancelToken, ProgressEvent, TextUnit};
use tracing::{debug, info, instrument};

use super::Extracted;
use crate::office::{Slide, SlideSource};

pub struct SlideExtractor<'a> {
    path: PathBuf,
    source: &'a dyn SlideSource,
}

impl<'a> SlideExtractor<'a> {
    pub(crate) fn new(path: PathBuf, source: &'a dyn SlideSource) -> Self {
        Self { path, source }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One `Slide N` unit per slide, with a progress event after each.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn extract(
        &self,
        progress: &mut dyn FnMut(ProgressEvent),
        cancel: &CancelToken,
    ) -> Result<Extracted> {
        let slides = self.source.slides(&self.path)?;
        let total = slides.len();
        info!(slides = total, "Extracting slide deck");

        let mut units = Vec::with_capacity(total);
        for (index, slide) in slides.iter().enumerate() {
            cancel.check()?;

            let ordinal = index + 1;
            let body = slide_text(slide);
            debug!(slide = ordinal, shapes = slide.shapes.len(), "Slide collected");

            units.push(TextUnit::slide(ordinal, body));
            progress(ProgressEvent::new(ordinal, total));
        }

        Ok(Extracted {
            units,
            unresolved: Vec::new(),
        })
    }
}

/// Every shape's text followed by a newline.
fn slide_text(slide: &Slide) -> String {
    slide.shapes.iter().fold(String::new(), |mut body, shape| {
        body.push_str(shape);
        body.push('\n');
        body
    })
}
