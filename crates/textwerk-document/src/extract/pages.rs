// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF extractor — rasterise, preprocess and recognise each page in order.

use std::path::{Path, PathBuf};

use textwerk_core::error::Result;
use textwerk_core::{CancelToken, ProgressEvent, TextUnit};
use tracing::{debug, info, instrument};

use super::{Extracted, UnitReader};
use crate::pdf::PageRasterizer;

pub struct PdfExtractor<'a> {
    path: PathBuf,
    rasterizer: &'a dyn PageRasterizer,
    reader: UnitReader<'a>,
    dpi: u32,
}

impl<'a> PdfExtractor<'a> {
    pub(crate) fn new(
        path: PathBuf,
        rasterizer: &'a dyn PageRasterizer,
        reader: UnitReader<'a>,
        dpi: u32,
    ) -> Self {
        Self {
            path,
            rasterizer,
            reader,
            dpi,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One `Page N` unit per page. The page count is read before the first
    /// page is rendered and is the `total` of every progress event.
    #[instrument(skip_all, fields(path = %self.path.display(), dpi = self.dpi))]
    pub fn extract(
        &self,
        progress: &mut dyn FnMut(ProgressEvent),
        cancel: &CancelToken,
    ) -> Result<Extracted> {
        let total = self.rasterizer.page_count(&self.path)?;
        info!(pages = total, "Extracting PDF");

        let mut units = Vec::with_capacity(total);
        for page in 1..=total {
            cancel.check()?;

            let image = self.rasterizer.render_page(&self.path, page, self.dpi)?;
            let text = self.reader.read(&image)?;
            debug!(page, chars = text.len(), "Page recognised");

            units.push(TextUnit::page(page, text));
            progress(ProgressEvent::new(page, total));
        }

        Ok(Extracted {
            units,
            unresolved: Vec::new(),
        })
    }
}
