// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF rasterizer — page tree inspection with `lopdf` and page rendering with
// poppler's `pdftoppm`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use lopdf::Document;
use textwerk_core::ExtractConfig;
use textwerk_core::error::{Result, TextwerkError};
use tracing::{debug, info, instrument};

use super::PageRasterizer;

/// Renders PDF pages one at a time through an external `pdftoppm` binary.
///
/// Each page is written as PNG into a scratch directory that is removed as
/// soon as the page has been decoded.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    executable: PathBuf,
}

impl PdftoppmRasterizer {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::new(&config.pdftoppm_path)
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// First line of `pdftoppm -v`, to confirm poppler is installed.
    pub fn version(&self) -> Result<String> {
        let output = Command::new(&self.executable)
            .arg("-v")
            .output()
            .map_err(|err| self.spawn_error(err))?;
        // pdftoppm prints its version banner on stderr.
        let banner = String::from_utf8_lossy(&output.stderr);
        Ok(banner.lines().next().unwrap_or_default().trim().to_owned())
    }

    fn spawn_error(&self, err: std::io::Error) -> TextwerkError {
        if err.kind() == ErrorKind::NotFound {
            TextwerkError::Rasterizer(format!(
                "pdftoppm not found at {}",
                self.executable.display()
            ))
        } else {
            TextwerkError::Rasterizer(format!(
                "failed to run {}: {}",
                self.executable.display(),
                err
            ))
        }
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    #[instrument(skip_all, fields(path = %path.display()))]
    fn page_count(&self, path: &Path) -> Result<usize> {
        let document = Document::load(path).map_err(|err| {
            TextwerkError::PdfError(format!("failed to open {}: {}", path.display(), err))
        })?;
        let pages = document.get_pages().len();
        info!(pages, "PDF page tree read");
        Ok(pages)
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    fn render_page(&self, path: &Path, page: usize, dpi: u32) -> Result<DynamicImage> {
        let scratch = tempfile::Builder::new()
            .prefix("textwerk-pdf-")
            .tempdir()?;
        let prefix = scratch.path().join("page");
        let page_arg = page.to_string();

        let output = Command::new(&self.executable)
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(&page_arg)
            .arg("-l")
            .arg(&page_arg)
            .arg("-singlefile")
            .arg(path)
            .arg(&prefix)
            .output()
            .map_err(|err| self.spawn_error(err))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TextwerkError::Rasterizer(format!(
                "pdftoppm failed on page {}: {}",
                page,
                stderr.trim()
            )));
        }

        // -singlefile writes `<prefix>.png` without a page suffix.
        let rendered = prefix.with_extension("png");
        let image = image::open(&rendered).map_err(|err| {
            TextwerkError::Rasterizer(format!(
                "cannot decode rendered page {} ({}): {}",
                page,
                rendered.display(),
                err
            ))
        })?;

        debug!(
            page,
            width = image.width(),
            height = image.height(),
            "Page rendered"
        );
        Ok(image)
    }
}
