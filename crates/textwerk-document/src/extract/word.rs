// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Word-processor extractor — native body text with OCR of embedded images
// substituted at their placeholders.
//
// Placeholders that cannot be resolved stay in the body verbatim and are
// reported as `UnresolvedPlaceholder` values. They never fail the document.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use textwerk_core::error::{Result, TextwerkError};
use textwerk_core::{CancelToken, ProgressEvent, RASTER_EXTENSIONS, TextUnit, UnresolvedPlaceholder};
use tracing::{debug, info, instrument, warn};

use super::{Extracted, UnitReader, decode_image};
use crate::office::{EmbeddedAsset, WordSource, placeholder};

const PLACEHOLDER_OPEN: &str = "[image:";

pub struct WordExtractor<'a> {
    path: PathBuf,
    source: &'a dyn WordSource,
    reader: UnitReader<'a>,
}

impl<'a> WordExtractor<'a> {
    pub(crate) fn new(path: PathBuf, source: &'a dyn WordSource, reader: UnitReader<'a>) -> Self {
        Self {
            path,
            source,
            reader,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole body is one unlabeled unit.
    ///
    /// Progress is reported once per raster asset; a document without raster
    /// assets reports a single `(1, 1)` when its body is ready.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn extract(
        &self,
        progress: &mut dyn FnMut(ProgressEvent),
        cancel: &CancelToken,
    ) -> Result<Extracted> {
        cancel.check()?;

        // Extracted assets live only as long as this directory.
        let scratch = tempfile::Builder::new()
            .prefix("textwerk-word-")
            .tempdir()?;
        let content = self.source.read(&self.path, scratch.path())?;

        let (raster, other): (Vec<&EmbeddedAsset>, Vec<&EmbeddedAsset>) =
            content.assets.iter().partition(|asset| is_raster(&asset.name));
        info!(
            raster = raster.len(),
            other = other.len(),
            "Extracting word document"
        );

        let mut body = content.body;
        let mut unresolved = Vec::new();

        let total = raster.len();
        for (index, asset) in raster.iter().enumerate() {
            cancel.check()?;

            let token = placeholder(&asset.name);
            if !body.contains(&token) {
                debug!(asset = %asset.name, "Asset is not referenced in the body");
            } else {
                match self.recognize_asset(asset) {
                    Ok(text) => {
                        body = body.replace(&token, &format!("[Image OCR: {}]", text.trim()));
                        debug!(asset = %asset.name, chars = text.len(), "Placeholder substituted");
                    }
                    Err(TextwerkError::Cancelled) => return Err(TextwerkError::Cancelled),
                    Err(err) => unresolved.push(report(&asset.name, err.to_string())),
                }
            }
            progress(ProgressEvent::new(index + 1, total));
        }

        for asset in &other {
            if body.contains(&placeholder(&asset.name)) {
                unresolved.push(report(&asset.name, "not a recognised raster image".into()));
            }
        }

        let known: HashSet<&str> = content.assets.iter().map(|a| a.name.as_str()).collect();
        for name in placeholder_names(&body) {
            if !known.contains(name.as_str()) {
                unresolved.push(report(&name, "no embedded asset with this name".into()));
            }
        }

        if total == 0 {
            progress(ProgressEvent::new(1, 1));
        }

        if let Err(err) = scratch.close() {
            warn!(error = %err, "Failed to remove scratch directory");
        }

        Ok(Extracted {
            units: vec![TextUnit::unlabeled(1, body)],
            unresolved,
        })
    }

    fn recognize_asset(&self, asset: &EmbeddedAsset) -> Result<String> {
        let image = decode_image(&asset.path, &asset.name)?;
        self.reader.read(&image)
    }
}

fn report(asset: &str, reason: String) -> UnresolvedPlaceholder {
    warn!(asset, reason = %reason, "Placeholder left unresolved");
    UnresolvedPlaceholder {
        asset: asset.to_owned(),
        reason,
    }
}

fn is_raster(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            RASTER_EXTENSIONS.contains(&ext.as_str())
        })
}

/// Distinct asset names of `[image:<name>]` tokens still in `body`, in order
/// of first appearance.
fn placeholder_names(body: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find(PLACEHOLDER_OPEN) {
        let after = &rest[start + PLACEHOLDER_OPEN.len()..];
        let Some(end) = after.find(']') else { break };
        let name = &after[..end];
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_owned());
        }
        rest = &after[end + 1..];
    }
    names
}

#[cfg(test)]
mod tests {
    use super::super::fakes::{FakeWord, ScriptedRecognizer, png_bytes};
    use super::*;
    use crate::image::preprocess::Preprocessor;

    fn reader(recognizer: &ScriptedRecognizer) -> UnitReader<'_> {
        UnitReader {
            preprocessor: Preprocessor::default(),
            recognizer,
        }
    }

    fn word(body: &str, assets: &[(&str, Vec<u8>)]) -> FakeWord {
        FakeWord {
            body: body.into(),
            assets: assets
                .iter()
                .map(|(name, bytes)| (name.to_string(), bytes.clone()))
                .collect(),
        }
    }

    fn run(source: &FakeWord, recognizer: &ScriptedRecognizer) -> (Extracted, Vec<ProgressEvent>) {
        let extractor = WordExtractor::new("memo.docx".into(), source, reader(recognizer));
        let mut events = Vec::new();
        let extracted = extractor
            .extract(&mut |event| events.push(event), &CancelToken::new())
            .unwrap();
        (extracted, events)
    }

    #[test]
    fn placeholder_replaced_with_trimmed_ocr_text() {
        let source = word(
            "Intro\n[image:fig1.png]\nOutro",
            &[("fig1.png", png_bytes())],
        );
        let recognizer = ScriptedRecognizer::new(&["  Hello\n"]);
        let (extracted, events) = run(&source, &recognizer);

        assert_eq!(extracted.units[0].body, "Intro\n[Image OCR: Hello]\nOutro");
        assert!(extracted.unresolved.is_empty());
        assert_eq!(events, vec![ProgressEvent::new(1, 1)]);
    }

    #[test]
    fn progress_per_raster_asset() {
        let source = word(
            "[image:a.png] [image:b.jpeg] [image:c.emf]",
            &[
                ("a.png", png_bytes()),
                ("b.jpeg", png_bytes()),
                ("c.emf", b"emf".to_vec()),
            ],
        );
        let recognizer = ScriptedRecognizer::new(&["A", "B"]);
        let (extracted, events) = run(&source, &recognizer);

        assert_eq!(
            events,
            vec![ProgressEvent::new(1, 2), ProgressEvent::new(2, 2)]
        );
        assert_eq!(
            extracted.units[0].body,
            "[Image OCR: A] [Image OCR: B] [image:c.emf]"
        );
        assert_eq!(extracted.unresolved.len(), 1);
        assert_eq!(extracted.unresolved[0].asset, "c.emf");
    }

    #[test]
    fn misnamed_asset_is_decoded_by_content() {
        let source = word("[image:photo.tiff]", &[("photo.tiff", png_bytes())]);
        let recognizer = ScriptedRecognizer::new(&["Caption"]);
        let (extracted, _) = run(&source, &recognizer);

        assert_eq!(extracted.units[0].body, "[Image OCR: Caption]");
        assert!(extracted.unresolved.is_empty());
    }

    #[test]
    fn recognition_failure_leaves_placeholder() {
        let source = word("see [image:x.png]", &[("x.png", png_bytes())]);
        let recognizer = ScriptedRecognizer::with_results(vec![Err(
            TextwerkError::EngineFailure("tesseract crashed".into()),
        )]);
        let (extracted, _) = run(&source, &recognizer);

        assert_eq!(extracted.units[0].body, "see [image:x.png]");
        assert_eq!(extracted.unresolved.len(), 1);
        assert!(extracted.unresolved[0].reason.contains("tesseract crashed"));
    }

    #[test]
    fn undecodable_raster_asset_is_unresolved() {
        let source = word("[image:broken.png]", &[("broken.png", b"garbage".to_vec())]);
        let recognizer = ScriptedRecognizer::new(&[]);
        let (extracted, _) = run(&source, &recognizer);

        assert_eq!(extracted.units[0].body, "[image:broken.png]");
        assert_eq!(extracted.unresolved[0].asset, "broken.png");
        assert_eq!(recognizer.call_count(), 0);
    }

    #[test]
    fn placeholder_without_asset_is_reported() {
        let source = word("before [image:ghost.png] after", &[]);
        let recognizer = ScriptedRecognizer::new(&[]);
        let (extracted, events) = run(&source, &recognizer);

        assert_eq!(extracted.units[0].body, "before [image:ghost.png] after");
        assert_eq!(extracted.unresolved.len(), 1);
        assert_eq!(extracted.unresolved[0].asset, "ghost.png");
        assert_eq!(events, vec![ProgressEvent::new(1, 1)]);
    }

    #[test]
    fn document_without_images_is_one_unlabeled_unit() {
        let source = word("Just text.\nTwo lines.", &[]);
        let recognizer = ScriptedRecognizer::new(&[]);
        let (extracted, events) = run(&source, &recognizer);

        assert_eq!(extracted.units, vec![TextUnit::unlabeled(1, "Just text.\nTwo lines.")]);
        assert_eq!(events, vec![ProgressEvent::new(1, 1)]);
    }

    #[test]
    fn repeated_placeholder_replaced_everywhere() {
        let source = word("[image:logo.png] x [image:logo.png]", &[("logo.png", png_bytes())]);
        let recognizer = ScriptedRecognizer::new(&["ACME"]);
        let (extracted, _) = run(&source, &recognizer);
        assert_eq!(
            extracted.units[0].body,
            "[Image OCR: ACME] x [Image OCR: ACME]"
        );
        assert_eq!(recognizer.call_count(), 1);
    }

    #[test]
    fn raster_extension_check() {
        assert!(is_raster("image1.PNG"));
        assert!(is_raster("photo.jpeg"));
        assert!(!is_raster("chart.emf"));
        assert!(!is_raster("scan.tif"));
        assert!(!is_raster("noext"));
    }

    #[test]
    fn finds_placeholder_names() {
        assert_eq!(
            placeholder_names("a [image:x.png] b [image:y.gif] [image:x.png] [image:"),
            vec!["x.png".to_string(), "y.gif".to_string()]
        );
    }
}
