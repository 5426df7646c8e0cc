// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction configuration.
//
// Engine and rasterizer locations are resolved once, here, and handed to the
// adapter constructors. Nothing in the pipeline reads ambient global state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, TextwerkError};
use crate::types::PreprocessLevel;

const CONFIG_FILE: &str = "config.json";

/// Which OCR engine backs the recognizer adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// External `tesseract` executable.
    #[default]
    Tesseract,
    /// Built-in `ocrs` engine (requires the `ocr` feature).
    Ocrs,
}

/// Persistent extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// OCR engine used for raster units.
    pub engine: EngineKind,
    /// Path or command name of the Tesseract executable.
    pub tesseract_path: PathBuf,
    /// Tesseract language model (e.g. `eng`, `deu+eng`).
    pub language: String,
    /// Directory holding the `ocrs` detection/recognition models.
    pub ocrs_model_dir: Option<PathBuf>,
    /// Path or command name of poppler's `pdftoppm`.
    pub pdftoppm_path: PathBuf,
    /// Rasterisation resolution for PDF pages.
    pub dpi: u32,
    /// Image restoration applied before recognition.
    pub preprocess: PreprocessLevel,
    /// Directory receiving `<stem>.txt` results.
    pub output_dir: PathBuf,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::Tesseract,
            tesseract_path: PathBuf::from("tesseract"),
            language: "eng".into(),
            ocrs_model_dir: None,
            pdftoppm_path: PathBuf::from("pdftoppm"),
            dpi: 300,
            preprocess: PreprocessLevel::Reduced,
            output_dir: PathBuf::from("."),
        }
    }
}

impl ExtractConfig {
    /// Load settings from an explicit JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|err| {
            TextwerkError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|err| {
            TextwerkError::Config(format!("cannot parse {}: {}", path.display(), err))
        })?;
        info!(path = %path.display(), "Configuration loaded");
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load_default() -> Result<Self> {
        let path = default_config_path();
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Write settings as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject settings no extraction can run with.
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(TextwerkError::Config("dpi must be greater than zero".into()));
        }
        if self.language.trim().is_empty() {
            return Err(TextwerkError::Config("OCR language must not be empty".into()));
        }
        Ok(())
    }
}

/// `$XDG_CONFIG_HOME/textwerk/config.json`, falling back to
/// `~/.config/textwerk/config.json`.
pub fn default_config_path() -> PathBuf {
    config_base().join("textwerk").join(CONFIG_FILE)
}

fn config_base() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    // Last resort — current directory.
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_wired_pipeline() {
        let config = ExtractConfig::default();
        assert_eq!(config.dpi, 300);
        assert_eq!(config.preprocess, PreprocessLevel::Reduced);
        assert_eq!(config.engine, EngineKind::Tesseract);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = ExtractConfig {
            language: "deu".into(),
            preprocess: PreprocessLevel::Full,
            ..ExtractConfig::default()
        };
        config.save(&path).unwrap();

        assert_eq!(ExtractConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "dpi": 150, "preprocess": "full" }"#).unwrap();

        let config = ExtractConfig::load(&path).unwrap();
        assert_eq!(config.dpi, 150);
        assert_eq!(config.preprocess, PreprocessLevel::Full);
        assert_eq!(config.language, "eng");
    }

    #[test]
    fn zero_dpi_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "dpi": 0 }"#).unwrap();

        assert!(matches!(
            ExtractConfig::load(&path),
            Err(TextwerkError::Config(_))
        ));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            ExtractConfig::load(&path),
            Err(TextwerkError::Config(_))
        ));
    }
}
