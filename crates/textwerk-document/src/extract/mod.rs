// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Format dispatch and the per-format unit extractors.
//
// `DocumentExtractor` owns the collaborator adapters and the preprocessing
// level. `resolve` picks an extractor from the file extension alone;
// `extract_file` runs the whole resolve → extract → assemble sequence.
// Units are processed strictly in source order on the calling thread.

pub mod assemble;
pub mod output;
pub mod pages;
pub mod raster;
pub mod slides;
pub mod word;

use std::path::Path;

use image::DynamicImage;
use textwerk_core::error::{Result, TextwerkError};
use textwerk_core::{
    CancelToken, EngineKind, ExtractConfig, ExtractionResult, FormatKind, PreprocessLevel,
    ProgressEvent, TextUnit, UnresolvedPlaceholder,
};
use tracing::{debug, info, instrument};

use crate::image::preprocess::Preprocessor;
use crate::ocr::{TesseractRecognizer, TextRecognizer};
use crate::office::{DocxReader, PptxReader, SlideSource, WordSource};
use crate::pdf::{PageRasterizer, PdftoppmRasterizer};

pub use pages::PdfExtractor;
pub use raster::ImageExtractor;
pub use slides::SlideExtractor;
pub use word::WordExtractor;

/// Rasterisation resolution used for PDF pages unless configured otherwise.
pub const DEFAULT_DPI: u32 = 300;

/// What one extractor produced, before assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// Units in strictly increasing ordinal order.
    pub units: Vec<TextUnit>,
    pub unresolved: Vec<UnresolvedPlaceholder>,
}

/// Preprocess then recognise: the step every raster unit goes through.
#[derive(Clone, Copy)]
pub(crate) struct UnitReader<'a> {
    preprocessor: Preprocessor,
    recognizer: &'a dyn TextRecognizer,
}

impl UnitReader<'_> {
    pub(crate) fn read(&self, image: &DynamicImage) -> Result<String> {
        let prepared = self.preprocessor.prepare(image);
        self.recognizer.recognize(&prepared)
    }
}

/// Decode a raster file, choosing the decoder from its leading bytes.
///
/// Embedded assets and scanned files are often misnamed (PNG data in a
/// `.jpeg`), so the extension is only a fallback.
pub(crate) fn decode_image(path: &Path, label: &str) -> Result<DynamicImage> {
    image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|err| TextwerkError::ImageError(format!("cannot decode {}: {}", label, err)))
}

/// Entry point of the extraction pipeline.
///
/// Holds no per-document state, so one instance can serve any number of
/// sequential or concurrent `extract_file` calls.
pub struct DocumentExtractor {
    recognizer: Box<dyn TextRecognizer>,
    rasterizer: Box<dyn PageRasterizer>,
    slides: Box<dyn SlideSource>,
    words: Box<dyn WordSource>,
    preprocessor: Preprocessor,
    dpi: u32,
}

impl DocumentExtractor {
    /// Assemble an extractor from explicit collaborators, with the default
    /// (reduced) preprocessing level and 300 DPI.
    pub fn new(
        recognizer: Box<dyn TextRecognizer>,
        rasterizer: Box<dyn PageRasterizer>,
        slides: Box<dyn SlideSource>,
        words: Box<dyn WordSource>,
    ) -> Self {
        Self {
            recognizer,
            rasterizer,
            slides,
            words,
            preprocessor: Preprocessor::default(),
            dpi: DEFAULT_DPI,
        }
    }

    /// Build the production adapters described by `config`.
    ///
    /// # Errors
    ///
    /// `TextwerkError::Config` for an invalid configuration or an engine that
    /// was not compiled in; `TextwerkError::EngineUnavailable` when the ocrs
    /// models cannot be loaded.
    #[instrument(skip_all, fields(engine = ?config.engine, preprocess = ?config.preprocess))]
    pub fn from_config(config: &ExtractConfig) -> Result<Self> {
        config.validate()?;

        let recognizer: Box<dyn TextRecognizer> = match config.engine {
            EngineKind::Tesseract => Box::new(TesseractRecognizer::from_config(config)),
            EngineKind::Ocrs => ocrs_recognizer(config)?,
        };
        info!(engine = recognizer.name(), dpi = config.dpi, "Extractor configured");

        Ok(Self::new(
            recognizer,
            Box::new(PdftoppmRasterizer::from_config(config)),
            Box::new(PptxReader::new()),
            Box::new(DocxReader::new()),
        )
        .with_preprocess(config.preprocess)
        .with_dpi(config.dpi))
    }

    pub fn with_preprocess(mut self, level: PreprocessLevel) -> Self {
        self.preprocessor = Preprocessor::new(level);
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn preprocess_level(&self) -> PreprocessLevel {
        self.preprocessor.level()
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn recognizer(&self) -> &dyn TextRecognizer {
        self.recognizer.as_ref()
    }

    /// Pick the extractor for `path` from its extension.
    ///
    /// Only the extension is consulted; the file is not opened. A misnamed
    /// file fails later, inside the chosen extractor.
    pub fn resolve(&self, path: &Path) -> Result<ExtractorHandle<'_>> {
        let format = FormatKind::from_path(path)?;
        let path = path.to_path_buf();
        let reader = self.unit_reader();
        debug!(path = %path.display(), format = %format, "Extractor resolved");

        Ok(match format {
            FormatKind::Pdf => ExtractorHandle::Pdf(PdfExtractor::new(
                path,
                self.rasterizer.as_ref(),
                reader,
                self.dpi,
            )),
            FormatKind::RasterImage => {
                ExtractorHandle::RasterImage(ImageExtractor::new(path, reader))
            }
            FormatKind::SlideDeck => {
                ExtractorHandle::SlideDeck(SlideExtractor::new(path, self.slides.as_ref()))
            }
            FormatKind::WordDoc => {
                ExtractorHandle::WordDoc(WordExtractor::new(path, self.words.as_ref(), reader))
            }
        })
    }

    /// Extract one document end to end and assemble its text.
    ///
    /// Nothing is written to disk; pair with [`crate::write_output`] once
    /// this returns `Ok`.
    #[instrument(skip(self, progress, cancel), fields(path = %path.display()))]
    pub fn extract_file(
        &self,
        path: &Path,
        progress: &mut dyn FnMut(ProgressEvent),
        cancel: &CancelToken,
    ) -> Result<ExtractionResult> {
        let handle = self.resolve(path)?;
        if !path.exists() {
            return Err(TextwerkError::SourceNotFound(path.to_path_buf()));
        }

        let format = handle.format();
        let extracted = handle.extract(progress, cancel)?;
        let text = assemble::assemble(&extracted.units);

        info!(
            format = %format,
            units = extracted.units.len(),
            unresolved = extracted.unresolved.len(),
            chars = text.len(),
            "Extraction complete"
        );
        Ok(ExtractionResult {
            format,
            units: extracted.units,
            text,
            unresolved: extracted.unresolved,
        })
    }

    fn unit_reader(&self) -> UnitReader<'_> {
        UnitReader {
            preprocessor: self.preprocessor,
            recognizer: self.recognizer.as_ref(),
        }
    }
}

#[cfg(feature = "ocr")]
fn ocrs_recognizer(config: &ExtractConfig) -> Result<Box<dyn TextRecognizer>> {
    let recognizer = crate::ocr::OcrsRecognizer::from_model_dir(config.ocrs_model_dir.as_deref())?;
    Ok(Box::new(recognizer))
}

#[cfg(not(feature = "ocr"))]
fn ocrs_recognizer(_config: &ExtractConfig) -> Result<Box<dyn TextRecognizer>> {
    Err(TextwerkError::Config(
        "the ocrs engine is not compiled in; rebuild with `--features ocr`".into(),
    ))
}

/// The extractor chosen for one source document.
pub enum ExtractorHandle<'a> {
    Pdf(PdfExtractor<'a>),
    RasterImage(ImageExtractor<'a>),
    SlideDeck(SlideExtractor<'a>),
    WordDoc(WordExtractor<'a>),
}

impl ExtractorHandle<'_> {
    pub fn format(&self) -> FormatKind {
        match self {
            Self::Pdf(_) => FormatKind::Pdf,
            Self::RasterImage(_) => FormatKind::RasterImage,
            Self::SlideDeck(_) => FormatKind::SlideDeck,
            Self::WordDoc(_) => FormatKind::WordDoc,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Pdf(e) => e.path(),
            Self::RasterImage(e) => e.path(),
            Self::SlideDeck(e) => e.path(),
            Self::WordDoc(e) => e.path(),
        }
    }

    /// Run the extractor. `progress` sees `(current, total)` after every unit
    /// with `total` fixed for the call; `cancel` is checked before each unit.
    pub fn extract(
        &self,
        progress: &mut dyn FnMut(ProgressEvent),
        cancel: &CancelToken,
    ) -> Result<Extracted> {
        match self {
            Self::Pdf(e) => e.extract(progress, cancel),
            Self::RasterImage(e) => e.extract(progress, cancel),
            Self::SlideDeck(e) => e.extract(progress, cancel),
            Self::WordDoc(e) => e.extract(progress, cancel),
        }
    }
}

impl std::fmt::Debug for ExtractorHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorHandle")
            .field("format", &self.format())
            .field("path", &self.path())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use crate::office::Slide;

    fn extractor(pages: usize, answers: &[&str]) -> DocumentExtractor {
        DocumentExtractor::new(
            Box::new(ScriptedRecognizer::new(answers)),
            Box::new(FakeRasterizer { pages }),
            Box::new(FakeSlides(vec![Slide {
                shapes: vec!["Title".into()],
            }])),
            Box::new(FakeWord {
                body: "plain body".into(),
                assets: Vec::new(),
            }),
        )
    }

    #[test]
    fn resolve_picks_extractor_by_extension() {
        let extractor = extractor(1, &[]);
        let cases = [
            ("a.pdf", FormatKind::Pdf),
            ("a.PNG", FormatKind::RasterImage),
            ("a.bmp", FormatKind::RasterImage),
            ("a.pptx", FormatKind::SlideDeck),
            ("a.doc", FormatKind::WordDoc),
        ];
        for (name, format) in cases {
            let handle = extractor.resolve(Path::new(name)).unwrap();
            assert_eq!(handle.format(), format, "{name}");
            assert_eq!(handle.path(), Path::new(name));
        }
    }

    #[test]
    fn resolve_rejects_unknown_extension() {
        let err = extractor(1, &[]).resolve(Path::new("notes.txt")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type: .txt");
    }

    #[test]
    fn unsupported_format_wins_over_missing_file() {
        let err = extractor(1, &[])
            .extract_file(Path::new("/nonexistent/x.xyz"), &mut |_| {}, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, TextwerkError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_source_is_reported() {
        let err = extractor(1, &[])
            .extract_file(Path::new("/nonexistent/report.pdf"), &mut |_| {}, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, TextwerkError::SourceNotFound(p) if p == Path::new("/nonexistent/report.pdf")));
    }

    #[test]
    fn extract_file_assembles_pdf_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, b"%PDF-1.5").unwrap();

        let result = extractor(2, &["first", "second"])
            .extract_file(&path, &mut |_| {}, &CancelToken::new())
            .unwrap();
        assert_eq!(result.format, FormatKind::Pdf);
        assert_eq!(result.units.len(), 2);
        assert_eq!(
            result.text,
            "\n\n--- Page 1 ---\n\nfirst\n\n--- Page 2 ---\n\nsecond"
        );
        assert!(result.unresolved.is_empty());
    }

    #[test]
    fn builder_settings_are_kept() {
        let extractor = extractor(1, &[])
            .with_preprocess(PreprocessLevel::Full)
            .with_dpi(150);
        assert_eq!(extractor.preprocess_level(), PreprocessLevel::Full);
        assert_eq!(extractor.dpi(), 150);
        assert_eq!(extractor.recognizer().name(), "scripted");
    }

    #[test]
    fn from_config_defaults_to_tesseract() {
        let extractor = DocumentExtractor::from_config(&ExtractConfig::default()).unwrap();
        assert_eq!(extractor.recognizer().name(), "tesseract");
        assert_eq!(extractor.dpi(), DEFAULT_DPI);
        assert_eq!(extractor.preprocess_level(), PreprocessLevel::Reduced);
    }

    #[test]
    fn from_config_rejects_invalid_settings() {
        let config = ExtractConfig {
            dpi: 0,
            ..ExtractConfig::default()
        };
        assert!(matches!(
            DocumentExtractor::from_config(&config),
            Err(TextwerkError::Config(_))
        ));
    }

    #[cfg(not(feature = "ocr"))]
    #[test]
    fn ocrs_engine_requires_feature() {
        let config = ExtractConfig {
            engine: EngineKind::Ocrs,
            ..ExtractConfig::default()
        };
        assert!(matches!(
            DocumentExtractor::from_config(&config),
            Err(TextwerkError::Config(_))
        ));
    }
}
