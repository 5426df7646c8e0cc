// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognizer adapters. The OCR engine itself is an external capability;
// these adapters only hand it a single-channel image and return its text.

pub mod tesseract;

#[cfg(feature = "ocr")]
pub mod ocrs_engine;

use image::GrayImage;
use textwerk_core::error::Result;

pub use tesseract::TesseractRecognizer;

#[cfg(feature = "ocr")]
pub use ocrs_engine::{OcrsConfig, OcrsRecognizer};

/// Image-to-text capability.
///
/// The `GrayImage` parameter enforces the single-channel input contract.
/// Implementations perform no retries; engine configuration is fixed at
/// construction time.
pub trait TextRecognizer: Send + Sync {
    /// Recognise all text in `image`.
    ///
    /// # Errors
    ///
    /// `TextwerkError::EngineUnavailable` when the engine cannot be reached,
    /// `TextwerkError::EngineFailure` when it ran and failed.
    fn recognize(&self, image: &GrayImage) -> Result<String>;

    /// Short engine name for logs and diagnostics.
    fn name(&self) -> &str;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn recognize(&self, image: &GrayImage) -> Result<String> {
        (**self).recognize(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
