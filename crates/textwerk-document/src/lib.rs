// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// textwerk-document — the document-to-text extraction pipeline.
//
// Provides image preprocessing for OCR, recognizer adapters (Tesseract, ocrs),
// PDF rasterisation, PPTX/DOCX container readers, the per-format unit
// extractors, format dispatch and result assembly.

pub mod extract;
pub mod image;
pub mod ocr;
pub mod office;
pub mod pdf;
pub mod tools;

// Re-export the primary types so callers can use `textwerk_document::DocumentExtractor` etc.
pub use extract::assemble::assemble;
pub use extract::output::{output_path, write_output};
pub use extract::{DocumentExtractor, ExtractorHandle};
pub use image::preprocess::Preprocessor;
pub use ocr::{TesseractRecognizer, TextRecognizer};
pub use office::{DocxReader, PptxReader, SlideSource, WordSource};
pub use pdf::{PageRasterizer, PdftoppmRasterizer};
pub use tools::{ToolCheck, ToolReport, check_tools};

#[cfg(feature = "ocr")]
pub use ocr::OcrsRecognizer;
