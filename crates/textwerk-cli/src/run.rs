// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-file work of the extract command: run one document on the blocking
// pool, mirror its progress onto a bar, then print or save the result.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use textwerk_core::error::{Result, TextwerkError};
use textwerk_core::{CancelToken, ExtractionResult, FormatKind, ProgressEvent};
use textwerk_document::{DocumentExtractor, write_output};
use tokio::sync::mpsc;
use tracing::warn;

/// Where and how a successful result is delivered.
#[derive(Debug, Clone, Copy)]
pub struct Delivery<'a> {
    pub to_stdout: bool,
    pub quiet: bool,
    pub output_dir: &'a Path,
}

/// Run one extraction on the blocking pool, feeding `bar` as units complete.
pub async fn extract_one(
    extractor: Arc<DocumentExtractor>,
    path: PathBuf,
    cancel: CancelToken,
    bar: &ProgressBar,
) -> Result<ExtractionResult> {
    let noun = FormatKind::from_path(&path)
        .map(|format| format.unit_noun())
        .unwrap_or("Unit");
    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();

    let task = tokio::task::spawn_blocking(move || {
        extractor.extract_file(
            &path,
            &mut |event| {
                // The receiver only goes away once the run is over.
                let _ = tx.send(event);
            },
            &cancel,
        )
    });

    // The channel closes when the blocking task drops its sender.
    while let Some(event) = rx.recv().await {
        bar.set_length(event.total as u64);
        bar.set_position(event.current as u64);
        bar.set_message(format!("Processing {} {} of {}", noun, event.current, event.total));
    }

    task.await.map_err(|err| {
        TextwerkError::Io(std::io::Error::other(format!("extraction task failed: {err}")))
    })?
}

/// Write or print a successful result, then report leftover placeholders.
pub fn deliver(
    delivery: &Delivery<'_>,
    input: &Path,
    result: &ExtractionResult,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<()> {
    if delivery.to_stdout {
        writeln!(out, "{}", result.text)?;
    } else {
        let written = write_output(result, input, delivery.output_dir)?;
        writeln!(out, "Text extracted and saved as: {}", written.display())?;
    }

    for placeholder in &result.unresolved {
        warn!(asset = %placeholder.asset, reason = %placeholder.reason, "Image left as placeholder");
        if !delivery.quiet {
            writeln!(
                err,
                "{}: image {} was not recognised ({})",
                input.display(),
                placeholder.asset,
                placeholder.reason
            )?;
        }
    }
    Ok(())
}

pub fn progress_bar(path: &Path, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.set_message(format!("Opening {}", path.display()));
    bar
}

/// First Ctrl-C cancels after the current unit; a second one exits at once.
pub fn spawn_interrupt_handler(cancel: CancelToken) {
    tokio::spawn(watch_interrupts(
        || async { tokio::signal::ctrl_c().await.is_ok() },
        cancel,
        || {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        },
    ));
}

/// `signal` resolves to `true` for each interrupt and `false` when no more
/// can arrive.
async fn watch_interrupts<S, F>(mut signal: S, cancel: CancelToken, exit: impl FnOnce())
where
    S: FnMut() -> F,
    F: Future<Output = bool>,
{
    if !signal().await {
        return;
    }
    warn!("Interrupt received, cancelling after the current unit");
    eprintln!("Cancelling after the current unit, press Ctrl-C again to stop now");
    cancel.cancel();

    if signal().await {
        warn!("Second interrupt received, exiting");
        exit();
    }
}

/// Conventional status for termination by SIGINT (128 + 2).
pub const INTERRUPTED_EXIT_CODE: i32 = 130;
