// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page counting and page rasterisation.

pub mod rasterizer;

use std::path::Path;

use image::DynamicImage;
use textwerk_core::error::Result;

pub use rasterizer::PdftoppmRasterizer;

/// PDF-to-raster capability.
///
/// The page count is known before any page is rendered so progress totals
/// stay constant for the whole extraction.
pub trait PageRasterizer: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self, path: &Path) -> Result<usize>;

    /// Render page `page` (1-indexed) at `dpi`.
    fn render_page(&self, path: &Path, page: usize, dpi: u32) -> Result<DynamicImage>;
}

impl<T: PageRasterizer + ?Sized> PageRasterizer for Box<T> {
    fn page_count(&self, path: &Path) -> Result<usize> {
        (**self).page_count(path)
    }

    fn render_page(&self, path: &Path, page: usize, dpi: u32) -> Result<DynamicImage> {
        (**self).render_page(path, page, dpi)
    }
}
