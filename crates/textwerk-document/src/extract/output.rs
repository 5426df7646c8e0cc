// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result file writer.

use std::path::{Path, PathBuf};

use textwerk_core::ExtractionResult;
use textwerk_core::error::{Result, TextwerkError};
use tracing::{info, instrument};

/// `<out_dir>/<input stem>.txt`.
///
/// The file lands in `out_dir` (the working directory by default), never
/// beside the source.
pub fn output_path(input: &Path, out_dir: &Path) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            TextwerkError::Config(format!("{} has no file name", input.display()))
        })?;
    let mut name = stem.to_os_string();
    name.push(".txt");
    Ok(out_dir.join(name))
}

/// Write the assembled text as UTF-8 and return the path written.
///
/// Call only with a successful result; failed extractions leave no file.
#[instrument(skip(result), fields(input = %input.display()))]
pub fn write_output(result: &ExtractionResult, input: &Path, out_dir: &Path) -> Result<PathBuf> {
    let path = output_path(input, out_dir)?;
    std::fs::write(&path, result.text.as_bytes())?;
    info!(output = %path.display(), bytes = result.text.len(), "Text written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use textwerk_core::{FormatKind, TextUnit};

    #[test]
    fn output_name_uses_stem_in_out_dir() {
        let path = output_path(Path::new("/scans/2026/report.final.pdf"), Path::new("out")).unwrap();
        assert_eq!(path, PathBuf::from("out/report.final.txt"));
    }

    #[test]
    fn output_name_ignores_source_directory() {
        let path = output_path(Path::new("/elsewhere/deck.pptx"), Path::new(".")).unwrap();
        assert_eq!(path, PathBuf::from("./deck.txt"));
    }

    #[test]
    fn path_without_name_is_rejected() {
        assert!(output_path(Path::new("/"), Path::new(".")).is_err());
    }

    #[test]
    fn writes_utf8_text() {
        let dir = tempfile::tempdir().unwrap();
        let result = ExtractionResult {
            format: FormatKind::RasterImage,
            units: vec![TextUnit::unlabeled(1, "Grüße")],
            text: "Grüße".into(),
            unresolved: Vec::new(),
        };
        let written = write_output(&result, Path::new("photo.jpg"), dir.path()).unwrap();
        assert_eq!(written, dir.path().join("photo.txt"));
        assert_eq!(std::fs::read_to_string(written).unwrap(), "Grüße");
    }
}
