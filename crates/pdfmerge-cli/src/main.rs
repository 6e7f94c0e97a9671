// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDFMerge CLI: merge images and PDFs into one annotated PDF.
//
// Entry point. Parses arguments, initialises logging, loads settings, admits
// the input files in the order given, and runs one conversion.

mod logging;
mod progress;
mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use pdfmerge_core::{MergeSettings, OrderedFileSet, PaperSize, PipelineConfig, SelectedFile, notice_for_error};
use pdfmerge_pipeline::{BatchPipeline, DirectorySink, RunOutcome};
use tracing::{info, warn};

use progress::{ProgressObserver, print_notice};

/// Merge images and PDFs, in the order given, into one PDF.
#[derive(Parser, Debug)]
#[command(name = "pdfmerge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input files (pdf, jpg, jpeg, png, gif, webp)
    files: Vec<PathBuf>,

    /// Directory the merged PDF is written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// JSON settings file to start from
    #[arg(short, long, env = "PDFMERGE_SETTINGS")]
    settings: Option<PathBuf>,

    /// Write the effective settings back to the settings file
    #[arg(long, requires = "settings")]
    save_settings: bool,

    /// Print file name, capture time, and GPS position above each image
    #[arg(long)]
    details: bool,

    /// Stamp "Image <n>" on each image page
    #[arg(long)]
    page_numbers: bool,

    /// Print the SHA-256 of each image file
    #[arg(long)]
    hash: bool,

    /// Lay image pages out in landscape
    #[arg(long)]
    landscape: bool,

    /// Paper size for image pages (A0-A4)
    #[arg(long, value_parser = parse_paper)]
    paper: Option<PaperSize>,

    /// Stamp a diagonal watermark with this text on every page
    #[arg(long, value_name = "TEXT")]
    watermark: Option<String>,

    /// Watermark colour as #rrggbb
    #[arg(long, value_name = "HEX")]
    watermark_color: Option<String>,

    /// Watermark opacity between 0 and 1
    #[arg(long, value_name = "F")]
    watermark_opacity: Option<f64>,

    /// Give up on the run after this many seconds
    #[arg(long, default_value = "60")]
    timeout: u64,

    /// Pause between chunks of files, in milliseconds
    #[arg(long, default_value = "0")]
    chunk_pause_ms: u64,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_paper(name: &str) -> Result<PaperSize, String> {
    PaperSize::from_name(name).ok_or_else(|| format!("unknown paper size {name:?}, expected A0-A4"))
}

impl Cli {
    /// Let command-line flags override the loaded settings.
    fn apply_overrides(&self, settings: &mut MergeSettings) {
        settings.print_image_details |= self.details;
        settings.print_image_page_numbers |= self.page_numbers;
        settings.print_image_hash |= self.hash;
        settings.landscape_orientation |= self.landscape;
        if let Some(paper) = self.paper {
            settings.paper_size = paper;
        }
        if let Some(text) = &self.watermark {
            settings.add_watermark = true;
            settings.watermark_text = text.clone();
        }
        if let Some(color) = &self.watermark_color {
            settings.watermark_color = color.clone();
        }
        if let Some(opacity) = self.watermark_opacity {
            settings.watermark_opacity = opacity;
        }
    }

    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            timeout_secs: self.timeout,
            chunk_pause_ms: self.chunk_pause_ms,
            ..PipelineConfig::default()
        }
    }
}

/// Read each input and offer it to the file set, reporting rejections.
async fn admit_inputs(paths: &[PathBuf]) -> OrderedFileSet {
    let mut files = OrderedFileSet::new();
    for path in paths {
        let name = display_name(path);
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %path.display(), %err, "cannot read input");
                eprintln!("[warning] {name} was not added: {err}");
                continue;
            }
        };
        if let Err(err) = files.admit(SelectedFile::new(name, bytes)) {
            print_notice(&notice_for_error(&err));
        }
    }
    info!(admitted = files.size(), requested = paths.len(), "inputs admitted");
    files
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut settings = match &cli.settings {
        Some(path) => settings::load(path)?,
        None => MergeSettings::default(),
    };
    cli.apply_overrides(&mut settings);

    let files = admit_inputs(&cli.files).await;
    let observer = Arc::new(ProgressObserver::new(files.size()));
    let sink = Arc::new(DirectorySink::new(&cli.output_dir));
    let pipeline = BatchPipeline::new(cli.pipeline_config(), sink)?.with_observer(observer);

    let outcome = pipeline.start(&files, &mut settings).await;

    if cli.save_settings
        && let Some(path) = &cli.settings
    {
        settings::save(path, &settings)?;
    }

    match outcome? {
        RunOutcome::Completed(report) => {
            for skipped in &report.skipped {
                warn!(file = %skipped.name, reason = %skipped.reason, "not included");
            }
            eprintln!(
                "{} pages, {} skipped: {}",
                report.pages,
                report.skipped.len(),
                report.link.label()
            );
            println!("{}", report.link.location);
            Ok(())
        }
        RunOutcome::Failed { message } => anyhow::bail!(message),
        RunOutcome::TimedOut { .. } => {
            anyhow::bail!("conversion took longer than {}s and was terminated", cli.timeout)
        }
    }
}
