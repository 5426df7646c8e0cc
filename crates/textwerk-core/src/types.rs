// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Textwerk extraction pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TextwerkError};

/// Container formats the pipeline knows how to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatKind {
    /// Scanned or raster PDF, rasterised page by page and recognised.
    Pdf,
    /// A single image file recognised as one unit.
    RasterImage,
    /// PPTX slide deck; shape text is read natively.
    SlideDeck,
    /// DOCX (or DOC-named) word-processor file with embedded images.
    WordDoc,
}

/// Extension table used for dispatch. Lower-case, without the leading dot.
const EXTENSION_TABLE: &[(&str, FormatKind)] = &[
    ("pdf", FormatKind::Pdf),
    ("jpg", FormatKind::RasterImage),
    ("jpeg", FormatKind::RasterImage),
    ("png", FormatKind::RasterImage),
    ("tiff", FormatKind::RasterImage),
    ("bmp", FormatKind::RasterImage),
    ("pptx", FormatKind::SlideDeck),
    ("docx", FormatKind::WordDoc),
    ("doc", FormatKind::WordDoc),
];

/// Raster extensions recognised for assets embedded in word-processor files.
pub const RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff"];

impl FormatKind {
    /// Infer the format from a bare extension (case-insensitive, no dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let lower = ext.to_ascii_lowercase();
        EXTENSION_TABLE
            .iter()
            .find(|(candidate, _)| *candidate == lower)
            .map(|(_, kind)| *kind)
    }

    /// Infer the format from a file path. Extension only, no content sniffing.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| {
            if ext.is_empty() {
                TextwerkError::UnsupportedFormat(format!("{} (no extension)", path.display()))
            } else {
                TextwerkError::UnsupportedFormat(format!(".{}", ext.to_ascii_lowercase()))
            }
        })
    }

    /// Every supported extension, in table order, with its format.
    pub fn supported_extensions() -> impl Iterator<Item = (&'static str, FormatKind)> {
        EXTENSION_TABLE.iter().copied()
    }

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::RasterImage => "Image",
            Self::SlideDeck => "Slide deck",
            Self::WordDoc => "Word document",
        }
    }

    /// Noun used when reporting progress through units of this format.
    pub fn unit_noun(&self) -> &'static str {
        match self {
            Self::Pdf => "Page",
            Self::RasterImage => "Image",
            Self::SlideDeck => "Slide",
            Self::WordDoc => "Embedded image",
        }
    }
}

impl std::fmt::Display for FormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Label carried by a unit that is rendered with a banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    Page,
    Slide,
}

impl UnitKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Page => "Page",
            Self::Slide => "Slide",
        }
    }
}

/// Recognised or natively extracted text of one logical unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextUnit {
    /// 1-based position in source order.
    pub ordinal: usize,
    /// `None` for units rendered without a banner (single image, word body).
    pub kind: Option<UnitKind>,
    pub body: String,
}

impl TextUnit {
    pub fn page(ordinal: usize, body: impl Into<String>) -> Self {
        Self {
            ordinal,
            kind: Some(UnitKind::Page),
            body: body.into(),
        }
    }

    pub fn slide(ordinal: usize, body: impl Into<String>) -> Self {
        Self {
            ordinal,
            kind: Some(UnitKind::Slide),
            body: body.into(),
        }
    }

    pub fn unlabeled(ordinal: usize, body: impl Into<String>) -> Self {
        Self {
            ordinal,
            kind: None,
            body: body.into(),
        }
    }
}

/// Emitted after each unit completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// 1-based index of the unit just completed.
    pub current: usize,
    /// Total unit count, constant for one extraction.
    pub total: usize,
}

impl ProgressEvent {
    pub fn new(current: usize, total: usize) -> Self {
        Self { current, total }
    }

    /// Completed fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.current as f32 / self.total as f32
    }
}

/// How much image restoration runs before recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreprocessLevel {
    /// Grayscale conversion only.
    #[default]
    Reduced,
    /// Grayscale, adaptive threshold, denoise, deskew, sharpen, invert.
    Full,
}

/// An embedded word-processor image whose placeholder was left in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedPlaceholder {
    /// Asset file name as referenced by the placeholder token.
    pub asset: String,
    pub reason: String,
}

/// Outcome of one whole-document extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub format: FormatKind,
    /// Units in strictly increasing ordinal order.
    pub units: Vec<TextUnit>,
    /// Concatenated output, banners included.
    pub text: String,
    pub unresolved: Vec<UnresolvedPlaceholder>,
}
