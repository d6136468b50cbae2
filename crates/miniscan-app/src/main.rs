// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mini Scanner: turn a phone photo of a page into a clean scan.
//
// Entry point. Initialises logging, loads the saved configuration, merges the
// command-line flags, runs the scan, and writes the results.

mod services;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use miniscan_core::error::Result;
use miniscan_core::human_errors::humanize_error;
use miniscan_core::{AppConfig, ScanMode, ScanOptions};

use services::app_services::{AppServices, OutputPaths};

/// File name used for the result when `--output` is not given.
const DEFAULT_OUTPUT_NAME: &str = "scanned_document.png";

#[derive(Parser, Debug)]
#[command(name = "miniscan")]
#[command(version, about = "Turn a photo of a document into a clean scan", long_about = None)]
struct Cli {
    /// Photo of the document (JPEG, PNG, ...)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Where to write the scan [default: scanned_document.png next to INPUT]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Tone mode: onix, color, gray or bw
    #[arg(short, long, value_name = "MODE")]
    mode: Option<String>,

    /// Skip page detection and perspective correction
    #[arg(long, conflicts_with = "crop")]
    no_crop: bool,

    /// Detect and straighten the page even if the saved config says not to
    #[arg(long)]
    crop: bool,

    /// Inpaint coloured pen and highlighter marks
    #[arg(long, conflicts_with = "keep_notes")]
    remove_notes: bool,

    /// Leave coloured marks alone even if the saved config removes them
    #[arg(long)]
    keep_notes: bool,

    /// Also write the straightened page before enhancement
    #[arg(long, value_name = "FILE")]
    rectified: Option<PathBuf>,

    /// Also write the note-removal mask
    #[arg(long, value_name = "FILE")]
    mask: Option<PathBuf>,

    /// Remember the effective mode and switches as the new defaults
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    /// Saved defaults with this invocation's flags applied on top.
    fn effective_config(&self, saved: &AppConfig) -> Result<AppConfig> {
        let mut config = saved.clone();
        if let Some(mode) = &self.mode {
            config.default_mode = mode.parse::<ScanMode>()?;
        }
        if self.no_crop {
            config.auto_crop = false;
        } else if self.crop {
            config.auto_crop = true;
        }
        if self.remove_notes {
            config.remove_colored_notes = true;
        } else if self.keep_notes {
            config.remove_colored_notes = false;
        }
        Ok(config)
    }

    /// Output locations. Saved preferences fill in the optional outputs next
    /// to the result when no explicit path is given.
    fn output_paths(&self, config: &AppConfig) -> OutputPaths {
        let result = self
            .output
            .clone()
            .unwrap_or_else(|| sibling(&self.input, DEFAULT_OUTPUT_NAME));
        let rectified = self
            .rectified
            .clone()
            .or_else(|| config.save_rectified.then(|| with_suffix(&result, "rectified")));
        let mask = self.mask.clone().or_else(|| {
            (config.save_mask && config.remove_colored_notes).then(|| with_suffix(&result, "mask"))
        });
        OutputPaths {
            result,
            rectified,
            mask,
        }
    }
}

/// `name` in the same directory as `path`.
fn sibling(path: &Path, name: &str) -> PathBuf {
    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// `scan.png` + `mask` -> `scan_mask.png`.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scan".into());
    path.with_file_name(format!("{stem}_{suffix}.png"))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("Mini Scanner starting");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "scan failed");
            let human = humanize_error(&err);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut services = AppServices::init();
    let config = cli.effective_config(services.config())?;
    let options: ScanOptions = config.scan_options();
    let outputs = cli.output_paths(&config);

    let report = services.scan_file(&cli.input, &options, &outputs)?;

    println!(
        "Scanned {} -> {}x{} ({} channel{}, mode {})",
        cli.input.display(),
        report.width,
        report.height,
        report.channels,
        if report.channels == 1 { "" } else { "s" },
        options.mode,
    );
    if let Some(coverage) = report.mask_coverage {
        println!("Coloured notes removed from {:.1}% of the page", coverage * 100.0);
    }
    for path in &report.written {
        println!("  wrote {}", path.display());
    }

    if cli.save_config {
        services.update_config(config)?;
        println!("Saved defaults to {}", services.data_dir().display());
    }
    Ok(())
}
