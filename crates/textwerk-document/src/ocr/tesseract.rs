// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract recognizer — runs the configured `tesseract` executable on a
// temporary PNG and reads the recognised text from its stdout.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::GrayImage;
use textwerk_core::ExtractConfig;
use textwerk_core::error::{Result, TextwerkError};
use tracing::{debug, instrument};

use super::TextRecognizer;

/// Adapter around the Tesseract command-line engine.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    executable: PathBuf,
    language: String,
}

impl TesseractRecognizer {
    pub fn new(executable: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            language: language.into(),
        }
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::new(&config.tesseract_path, &config.language)
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// First line of `tesseract --version`, to confirm the engine is installed.
    pub fn version(&self) -> Result<String> {
        let output = Command::new(&self.executable)
            .arg("--version")
            .output()
            .map_err(|err| self.spawn_error(err))?;
        // Older releases print the banner on stderr.
        let text = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };
        Ok(text.lines().next().unwrap_or_default().trim().to_owned())
    }

    fn spawn_error(&self, err: std::io::Error) -> TextwerkError {
        if err.kind() == ErrorKind::NotFound {
            TextwerkError::EngineUnavailable(format!(
                "tesseract executable not found at {}",
                self.executable.display()
            ))
        } else {
            TextwerkError::EngineUnavailable(format!(
                "failed to run {}: {}",
                self.executable.display(),
                err
            ))
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    #[instrument(skip_all, fields(width = image.width(), height = image.height(), lang = %self.language))]
    fn recognize(&self, image: &GrayImage) -> Result<String> {
        let input = tempfile::Builder::new()
            .prefix("textwerk-ocr-")
            .suffix(".png")
            .tempfile()?;
        image.save(input.path()).map_err(|err| {
            TextwerkError::ImageError(format!("failed to stage image for OCR: {}", err))
        })?;

        let output = Command::new(&self.executable)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|err| self.spawn_error(err))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TextwerkError::EngineFailure(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(chars = text.len(), "Tesseract recognition complete");
        Ok(text)
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}
