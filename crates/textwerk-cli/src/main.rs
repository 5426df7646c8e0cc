// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Textwerk — document-to-text extraction from the command line.
//
// Entry point. Initialises logging, resolves configuration, and extracts each
// file in turn. Extraction is blocking, so every document runs on the
// blocking pool while progress events flow back over a channel to the
// progress bar.

mod args;
mod run;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use textwerk_core::human_errors::humanize_error;
use textwerk_core::{CancelToken, ExtractConfig, FormatKind};
use textwerk_document::{DocumentExtractor, check_tools};
use tracing::info;

use args::{Cli, Command};
use run::{Delivery, deliver, extract_one, progress_bar, spawn_interrupt_handler};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", humanize_error(&err));
            return ExitCode::FAILURE;
        }
    };

    match &cli.command {
        Some(Command::Check) => cmd_check(&config),
        Some(Command::Formats) => cmd_formats(),
        Some(Command::Config { save }) => cmd_config(&cli, &config, *save),
        None if cli.files.is_empty() => {
            eprintln!("Usage: textwerk [OPTIONS] <FILES>...");
            eprintln!("       textwerk --help for more information");
            ExitCode::FAILURE
        }
        None => cmd_extract(&cli, config).await,
    }
}

// -- Extraction ---------------------------------------------------------------

async fn cmd_extract(cli: &Cli, config: ExtractConfig) -> ExitCode {
    let extractor = match DocumentExtractor::from_config(&config) {
        Ok(extractor) => Arc::new(extractor),
        Err(err) => {
            eprintln!("Error: {}", humanize_error(&err));
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancelToken::new();
    spawn_interrupt_handler(cancel.clone());

    let delivery = Delivery {
        to_stdout: cli.stdout,
        quiet: cli.quiet,
        output_dir: &config.output_dir,
    };

    let mut failed = 0usize;
    for path in &cli.files {
        if cancel.is_cancelled() {
            break;
        }

        let bar = progress_bar(path, cli.quiet);
        let outcome = extract_one(Arc::clone(&extractor), path.clone(), cancel.clone(), &bar).await;
        bar.finish_and_clear();

        let delivered = outcome.and_then(|result| {
            deliver(
                &delivery,
                path,
                &result,
                &mut std::io::stdout().lock(),
                &mut std::io::stderr().lock(),
            )
        });
        match delivered {
            Ok(()) => {}
            Err(err) => {
                failed += 1;
                eprintln!("{}: {}", path.display(), humanize_error(&err));
            }
        }
    }

    info!(files = cli.files.len(), failed, "Run complete");
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

// -- Subcommands --------------------------------------------------------------

fn cmd_check(config: &ExtractConfig) -> ExitCode {
    let report = check_tools(config);
    print!("{}", report.to_text());
    if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn cmd_formats() -> ExitCode {
    for (ext, format) in FormatKind::supported_extensions() {
        println!(".{:<6} {}", ext, format.label());
    }
    ExitCode::SUCCESS
}

fn cmd_config(cli: &Cli, config: &ExtractConfig, save: bool) -> ExitCode {
    match serde_json::to_string_pretty(config) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("Error: {}", humanize_error(&err.into()));
            return ExitCode::FAILURE;
        }
    }

    if save {
        let path = cli
            .config
            .clone()
            .unwrap_or_else(textwerk_core::config::default_config_path);
        if let Err(err) = config.save(&path) {
            eprintln!("Error: {}", humanize_error(&err));
            return ExitCode::FAILURE;
        }
        println!("Configuration saved to {}", path.display());
    }
    ExitCode::SUCCESS
}
