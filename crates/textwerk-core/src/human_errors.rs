// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the front end presents the failure.

use crate::error::TextwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The same input may succeed on another attempt.
    Transient,
    /// The user must change something (install a tool, fix a path).
    ActionRequired,
    /// The input itself cannot be processed.
    Permanent,
}

/// A human-readable error with a plain English message and a suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub severity: Severity,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `TextwerkError` into a `HumanError`.
pub fn humanize_error(err: &TextwerkError) -> HumanError {
    match err {
        TextwerkError::UnsupportedFormat(detail) => HumanError {
            message: format!("Unsupported file type ({detail})."),
            suggestion: "Supported files are PDF, JPG, JPEG, PNG, TIFF, BMP, PPTX, DOCX and DOC.".into(),
            severity: Severity::Permanent,
        },

        TextwerkError::SourceNotFound(path) => HumanError {
            message: format!("The file {} couldn't be found.", path.display()),
            suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
            severity: Severity::ActionRequired,
        },

        TextwerkError::EngineUnavailable(detail) => HumanError {
            message: "The text recognition engine isn't available.".into(),
            suggestion: format!(
                "Install Tesseract OCR or point the configuration at its executable. ({detail})"
            ),
            severity: Severity::ActionRequired,
        },

        TextwerkError::EngineFailure(detail) => HumanError {
            message: "Text recognition failed on this document.".into(),
            suggestion: format!("Check that the OCR language model is installed. ({detail})"),
            severity: Severity::Transient,
        },

        TextwerkError::Rasterizer(detail) => humanize_rasterizer_error(detail),

        TextwerkError::ContainerParse(_) => HumanError {
            message: "This document couldn't be opened.".into(),
            suggestion: "The file may be damaged, or saved in an older format. Try re-saving it as DOCX or PPTX.".into(),
            severity: Severity::Permanent,
        },

        TextwerkError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as PNG first.".into(),
            severity: Severity::Permanent,
        },

        TextwerkError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try opening it in a PDF viewer first to check it works.".into(),
            severity: Severity::Permanent,
        },

        TextwerkError::Cancelled => HumanError {
            message: "Extraction was cancelled.".into(),
            suggestion: "No output file was written.".into(),
            severity: Severity::Transient,
        },

        TextwerkError::Config(detail) => HumanError {
            message: "The configuration is invalid.".into(),
            suggestion: format!("Fix the configuration file or command-line options. ({detail})"),
            severity: Severity::ActionRequired,
        },

        TextwerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "A file couldn't be found.".into(),
                suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission denied while reading or writing a file.".into(),
                suggestion: "Check the file permissions and the output directory.".into(),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                severity: Severity::Transient,
            },
        },

        TextwerkError::Serialization(_) => HumanError {
            message: "Internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            severity: Severity::Transient,
        },
    }
}

fn humanize_rasterizer_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();
    if lower.contains("not found") || lower.contains("no such file") {
        HumanError {
            message: "The PDF renderer isn't installed.".into(),
            suggestion: "Install poppler (pdftoppm) or set its location in the configuration.".into(),
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("password") || lower.contains("encrypt") {
        HumanError {
            message: "This PDF is password-protected.".into(),
            suggestion: "Remove the password in a PDF viewer, then try again.".into(),
            severity: Severity::Permanent,
        }
    } else {
        HumanError {
            message: "The PDF pages couldn't be rendered.".into(),
            suggestion: format!("The file may be damaged. (Detail: {detail})"),
            severity: Severity::Permanent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_is_permanent() {
        let human = humanize_error(&TextwerkError::UnsupportedFormat(".xls".into()));
        assert_eq!(human.severity, Severity::Permanent);
        assert!(human.message.contains(".xls"));
    }

    #[test]
    fn missing_engine_requires_action() {
        let human = humanize_error(&TextwerkError::EngineUnavailable("tesseract".into()));
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn missing_rasterizer_requires_action() {
        let human = humanize_error(&TextwerkError::Rasterizer(
            "failed to run pdftoppm: No such file or directory".into(),
        ));
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn encrypted_pdf_is_permanent() {
        let human = humanize_error(&TextwerkError::Rasterizer("Incorrect password".into()));
        assert_eq!(human.severity, Severity::Permanent);
    }

    #[test]
    fn not_found_io_requires_action() {
        let err = TextwerkError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }
}
