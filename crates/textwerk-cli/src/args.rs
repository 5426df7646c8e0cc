// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments and their mapping onto `ExtractConfig`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use textwerk_core::error::Result;
use textwerk_core::{EngineKind, ExtractConfig, PreprocessLevel};

#[derive(Debug, Parser)]
#[command(name = "textwerk")]
#[command(version)]
#[command(about = "Extract text from scanned PDFs, images, slide decks and Word documents", long_about = None)]
pub struct Cli {
    /// Documents to extract (.pdf, .png, .jpg, .jpeg, .tiff, .bmp, .pptx, .docx, .doc)
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Configuration file (defaults to $XDG_CONFIG_HOME/textwerk/config.json)
    #[arg(long, value_name = "FILE", global = true, env = "TEXTWERK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory receiving <name>.txt (defaults to the working directory)
    #[arg(short, long, value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Rasterisation resolution for PDF pages
    #[arg(long, value_name = "N", global = true)]
    pub dpi: Option<u32>,

    /// Tesseract language model, e.g. "eng" or "deu+eng"
    #[arg(long = "lang", value_name = "CODE", global = true)]
    pub language: Option<String>,

    /// Tesseract executable
    #[arg(long, value_name = "PATH", global = true)]
    pub tesseract: Option<PathBuf>,

    /// poppler `pdftoppm` executable
    #[arg(long, value_name = "PATH", global = true)]
    pub pdftoppm: Option<PathBuf>,

    /// Image restoration before recognition
    #[arg(long, value_enum, global = true)]
    pub preprocess: Option<PreprocessArg>,

    /// OCR engine
    #[arg(long, value_enum, global = true)]
    pub engine: Option<EngineArg>,

    /// Directory holding the ocrs models
    #[arg(long, value_name = "DIR", global = true)]
    pub ocrs_models: Option<PathBuf>,

    /// Print the text instead of writing a file
    #[arg(long)]
    pub stdout: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only errors, no progress bar
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the OCR engine and PDF rasterizer are installed
    Check,
    /// List supported file extensions
    Formats,
    /// Print the effective configuration as JSON
    Config {
        /// Also write it to the configuration file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum PreprocessArg {
    /// Grayscale conversion only
    Reduced,
    /// Threshold, denoise, deskew, sharpen and invert
    Full,
}

impl From<PreprocessArg> for PreprocessLevel {
    fn from(arg: PreprocessArg) -> Self {
        match arg {
            PreprocessArg::Reduced => PreprocessLevel::Reduced,
            PreprocessArg::Full => PreprocessLevel::Full,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum EngineArg {
    /// External tesseract executable
    Tesseract,
    /// Built-in ocrs engine (needs the `ocr` feature)
    Ocrs,
}

impl From<EngineArg> for EngineKind {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Tesseract => EngineKind::Tesseract,
            EngineArg::Ocrs => EngineKind::Ocrs,
        }
    }
}

impl Cli {
    /// Base configuration from file, with command-line overrides applied.
    pub fn resolve_config(&self) -> Result<ExtractConfig> {
        let mut config = match &self.config {
            Some(path) => ExtractConfig::load(path)?,
            None => ExtractConfig::load_default()?,
        };
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut ExtractConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(dpi) = self.dpi {
            config.dpi = dpi;
        }
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        if let Some(path) = &self.tesseract {
            config.tesseract_path = path.clone();
        }
        if let Some(path) = &self.pdftoppm {
            config.pdftoppm_path = path.clone();
        }
        if let Some(level) = self.preprocess {
            config.preprocess = level.into();
        }
        if let Some(engine) = self.engine {
            config.engine = engine.into();
        }
        if let Some(dir) = &self.ocrs_models {
            config.ocrs_model_dir = Some(dir.clone());
        }
    }

    /// Filter directive used when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
