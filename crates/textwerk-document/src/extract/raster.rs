// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-image extractor.

use std::path::{Path, PathBuf};

use textwerk_core::error::Result;
use textwerk_core::{CancelToken, ProgressEvent, TextUnit};
use tracing::{debug, instrument};

use super::{Extracted, UnitReader, decode_image};

pub struct ImageExtractor<'a> {
    path: PathBuf,
    reader: UnitReader<'a>,
}

impl<'a> ImageExtractor<'a> {
    pub(crate) fn new(path: PathBuf, reader: UnitReader<'a>) -> Self {
        Self { path, reader }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole image is one unlabeled unit, followed by progress `(1, 1)`.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn extract(
        &self,
        progress: &mut dyn FnMut(ProgressEvent),
        cancel: &CancelToken,
    ) -> Result<Extracted> {
        cancel.check()?;

        let image = decode_image(&self.path, &self.path.display().to_string())?;
        debug!(width = image.width(), height = image.height(), "Image decoded");

        let text = self.reader.read(&image)?;
        progress(ProgressEvent::new(1, 1));

        Ok(Extracted {
            units: vec![TextUnit::unlabeled(1, text)],
            unresolved: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::fakes::{ScriptedRecognizer, png_bytes};
    use super::*;
    use crate::image::preprocess::Preprocessor;
    use textwerk_core::error::TextwerkError;

    fn reader(recognizer: &ScriptedRecognizer) -> UnitReader<'_> {
        UnitReader {
            preprocessor: Preprocessor::default(),
            recognizer,
        }
    }

    #[test]
    fn single_unit_and_single_progress_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let recognizer = ScriptedRecognizer::new(&["TOTAL 12.50"]);
        let extractor = ImageExtractor::new(path, reader(&recognizer));

        let mut events = Vec::new();
        let extracted = extractor
            .extract(&mut |event| events.push(event), &CancelToken::new())
            .unwrap();

        assert_eq!(events, vec![ProgressEvent::new(1, 1)]);
        assert_eq!(extracted.units, vec![TextUnit::unlabeled(1, "TOTAL 12.50")]);
    }

    #[test]
    fn decoder_follows_content_not_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.jpg");
        std::fs::write(&path, png_bytes()).unwrap();

        let recognizer = ScriptedRecognizer::new(&["misnamed but readable"]);
        let extractor = ImageExtractor::new(path, reader(&recognizer));
        let extracted = extractor
            .extract(&mut |_| {}, &CancelToken::new())
            .unwrap();

        assert_eq!(extracted.units[0].body, "misnamed but readable");
        assert_eq!(recognizer.call_count(), 1);
    }

    #[test]
    fn undecodable_image_is_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();

        let recognizer = ScriptedRecognizer::new(&[]);
        let extractor = ImageExtractor::new(path, reader(&recognizer));
        let err = extractor
            .extract(&mut |_| {}, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, TextwerkError::ImageError(_)));
        assert_eq!(recognizer.call_count(), 0);
    }

    #[test]
    fn cancelled_before_start() {
        let recognizer = ScriptedRecognizer::new(&[]);
        let extractor = ImageExtractor::new("a.png".into(), reader(&recognizer));
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            extractor.extract(&mut |_| {}, &cancel),
            Err(TextwerkError::Cancelled)
        ));
    }
}
