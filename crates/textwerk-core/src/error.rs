// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Textwerk.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Textwerk operations.
///
/// Every variant is fatal for the document being extracted. Embedded images
/// that cannot be recognised inside a word-processor document are reported
/// through `UnresolvedPlaceholder` values instead, never through this enum.
#[derive(Debug, Error)]
pub enum TextwerkError {
    // -- Dispatch errors --
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    // -- Collaborator errors --
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("OCR engine failed: {0}")]
    EngineFailure(String),

    #[error("PDF rasterization failed: {0}")]
    Rasterizer(String),

    #[error("document container could not be parsed: {0}")]
    ContainerParse(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Control flow --
    #[error("extraction cancelled")]
    Cancelled,

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TextwerkError {
    /// Whether the error was raised by an external collaborator (OCR engine,
    /// rasterizer, container parser, image codec).
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            Self::EngineUnavailable(_)
                | Self::EngineFailure(_)
                | Self::Rasterizer(_)
                | Self::ContainerParse(_)
                | Self::ImageError(_)
                | Self::PdfError(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TextwerkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_message_is_verbatim() {
        let err = TextwerkError::UnsupportedFormat(".xyz".into());
        assert_eq!(err.to_string(), "Unsupported file type: .xyz");
    }

    #[test]
    fn collaborator_classification() {
        assert!(TextwerkError::EngineFailure("exit 1".into()).is_collaborator_failure());
        assert!(TextwerkError::Rasterizer("missing".into()).is_collaborator_failure());
        assert!(!TextwerkError::Cancelled.is_collaborator_failure());
        assert!(!TextwerkError::SourceNotFound("a.pdf".into()).is_collaborator_failure());
    }
}
