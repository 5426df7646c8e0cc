// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Environment check for the external tools the pipeline depends on.
//
// Probes the configured OCR engine and the PDF rasterizer without touching
// any document, so a missing install shows up before the first extraction.

use textwerk_core::{EngineKind, ExtractConfig};
use tracing::{info, instrument};

use crate::ocr::TesseractRecognizer;
use crate::pdf::PdftoppmRasterizer;

/// Result of probing one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCheck {
    /// Tool name shown to the user.
    pub name: String,
    pub passed: bool,
    /// Version banner on success, the failure otherwise.
    pub detail: String,
    /// What to do if the check failed.
    pub fix: Option<String>,
}

/// Every check, in the order they were run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolReport {
    pub checks: Vec<ToolCheck>,
}

impl ToolReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    /// Plain-text rendering, one line per check plus its fix.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for check in &self.checks {
            let mark = if check.passed { "ok" } else { "FAILED" };
            text.push_str(&format!("{:<10} {:<6} {}\n", check.name, mark, check.detail));
            if let Some(fix) = &check.fix {
                text.push_str(&format!("{:<17} {}\n", "", fix));
            }
        }
        if self.all_passed() {
            text.push_str("All tools available.\n");
        }
        text
    }
}

/// Probe the recognizer and rasterizer described by `config`.
#[instrument(skip_all, fields(engine = ?config.engine))]
pub fn check_tools(config: &ExtractConfig) -> ToolReport {
    let checks = vec![check_engine(config), check_rasterizer(config)];
    let report = ToolReport { checks };
    info!(passed = report.all_passed(), "Tool check complete");
    report
}

fn check_engine(config: &ExtractConfig) -> ToolCheck {
    match config.engine {
        EngineKind::Tesseract => check_tesseract(config),
        EngineKind::Ocrs => check_ocrs(config),
    }
}

fn check_tesseract(config: &ExtractConfig) -> ToolCheck {
    let recognizer = TesseractRecognizer::from_config(config);
    match recognizer.version() {
        Ok(version) => ToolCheck {
            name: "tesseract".into(),
            passed: true,
            detail: format!("{} (language {})", version, recognizer.language()),
            fix: None,
        },
        Err(err) => ToolCheck {
            name: "tesseract".into(),
            passed: false,
            detail: err.to_string(),
            fix: Some(
                "Install Tesseract OCR (e.g. `apt install tesseract-ocr`) or set `tesseract_path`."
                    .into(),
            ),
        },
    }
}

#[cfg(feature = "ocr")]
fn check_ocrs(config: &ExtractConfig) -> ToolCheck {
    use crate::ocr::OcrsConfig;

    let models = match &config.ocrs_model_dir {
        Some(dir) => OcrsConfig::from_dir(dir),
        None => OcrsConfig::default(),
    };
    match models.validate() {
        Ok(()) => ToolCheck {
            name: "ocrs".into(),
            passed: true,
            detail: format!(
                "models at {}",
                models
                    .detection_model_path
                    .parent()
                    .unwrap_or(&models.detection_model_path)
                    .display()
            ),
            fix: None,
        },
        Err(err) => ToolCheck {
            name: "ocrs".into(),
            passed: false,
            detail: err.to_string(),
            fix: Some("Run `ocrs-cli` once to download the models, or set `ocrs_model_dir`.".into()),
        },
    }
}

#[cfg(not(feature = "ocr"))]
fn check_ocrs(_config: &ExtractConfig) -> ToolCheck {
    ToolCheck {
        name: "ocrs".into(),
        passed: false,
        detail: "the ocrs engine is not compiled in".into(),
        fix: Some("Rebuild with `--features ocr`, or use the tesseract engine.".into()),
    }
}

fn check_rasterizer(config: &ExtractConfig) -> ToolCheck {
    let rasterizer = PdftoppmRasterizer::from_config(config);
    match rasterizer.version() {
        Ok(version) => ToolCheck {
            name: "pdftoppm".into(),
            passed: true,
            detail: version,
            fix: None,
        },
        Err(err) => ToolCheck {
            name: "pdftoppm".into(),
            passed: false,
            detail: err.to_string(),
            fix: Some(
                "Install poppler (e.g. `apt install poppler-utils`) or set `pdftoppm_path`."
                    .into(),
            ),
        },
    }
}
