// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch pipeline: runs one conversion at a time over a snapshot of the
// ordered file set.
//
// Files are handled strictly in list order, in chunks, with a pause and a
// progress report after each chunk. Image decoding, resampling, and hashing
// run on the blocking pool. Building the document is bounded by a deadline;
// when it fires the partial document is dropped. Only a document finished
// in time is handed to the sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use pdfmerge_core::error::{PdfMergeError, Result};
use pdfmerge_core::{
    ImageDetails, MergeSettings, Notice, OrderedFileSet, PageSpec, PendingFile, PipelineConfig,
    RunId, notice_for_error,
};
use pdfmerge_document::{ForeignDocument, ImageNormalizer, MetadataExtractor, PageComposer};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::artifact::{ArtifactLink, ArtifactSink, artifact_filename};
use crate::fonts::load_font_set;
use crate::observer::{NoopObserver, SharedObserver};
use crate::run::{ConversionRun, RunState};

/// An input file that was left out of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub link: ArtifactLink,
    /// Pages in the delivered PDF.
    pub pages: usize,
    /// Pages produced from image inputs.
    pub image_pages: u32,
    /// Pages that received the watermark (zero when it was off).
    pub watermarked_pages: usize,
    pub skipped: Vec<SkippedFile>,
}

/// A serialised document that has not been delivered yet.
struct ComposedOutput {
    bytes: Vec<u8>,
    pages: usize,
    watermarked_pages: usize,
    skipped: Vec<SkippedFile>,
}

/// How a run ended.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(RunReport),
    /// A run-level error aborted the run; `message` is the error text.
    Failed { message: String },
    /// The deadline fired; the presentation should reset after `reset_after`.
    TimedOut { reset_after: Duration },
}

impl RunOutcome {
    /// Terminal state this outcome corresponds to.
    pub fn state(&self) -> RunState {
        match self {
            Self::Completed(_) => RunState::Completed,
            Self::Failed { .. } => RunState::Failed,
            Self::TimedOut { .. } => RunState::TimedOut,
        }
    }
}

/// Clears the single-run flag however `start` exits.
struct ActiveGuard<'a>(&'a AtomicBool);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives conversion runs and delivers their output to a sink.
pub struct BatchPipeline {
    config: PipelineConfig,
    sink: Arc<dyn ArtifactSink>,
    observer: SharedObserver,
    extractor: MetadataExtractor,
    normalizer: ImageNormalizer,
    active: AtomicBool,
    state: watch::Sender<RunState>,
}

impl BatchPipeline {
    // -- Construction ---------------------------------------------------------

    /// Pipeline with the given tuning that delivers into `sink`.
    pub fn new(config: PipelineConfig, sink: Arc<dyn ArtifactSink>) -> Result<Self> {
        config.validate()?;
        let normalizer = ImageNormalizer::new(config.raster_dpi, config.jpeg_quality);
        let (state, _) = watch::channel(RunState::Idle);
        Ok(Self {
            config,
            sink,
            observer: Arc::new(NoopObserver),
            extractor: MetadataExtractor::default(),
            normalizer,
            active: AtomicBool::new(false),
            state,
        })
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Replace the EXIF-backed metadata extractor.
    pub fn with_extractor(mut self, extractor: MetadataExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    // -- Inspection -----------------------------------------------------------

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Receiver that sees every state transition.
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn transition(&self, state: RunState) {
        self.state.send_replace(state);
        self.observer.on_state(state);
        info!(%state, "pipeline state changed");
    }

    // -- Running --------------------------------------------------------------

    /// Convert `files` into one PDF using `settings`.
    ///
    /// Returns `Err` only when the run never starts: the set is empty or
    /// another run is active. Everything after that ends in a [`RunOutcome`].
    /// On every exit the watermark setting is switched off.
    #[instrument(skip_all, fields(files = files.size()))]
    pub async fn start(
        &self,
        files: &OrderedFileSet,
        settings: &mut MergeSettings,
    ) -> Result<RunOutcome> {
        if files.is_empty() {
            warn!("conversion requested with no files selected");
            self.observer.on_notice(&Notice::nothing_selected());
            return Err(PdfMergeError::EmptyFileSet);
        }
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("conversion requested while another run is active");
            return Err(PdfMergeError::RunInProgress);
        }
        let _guard = ActiveGuard(&self.active);

        let snapshot = files.snapshot();
        let mut run = ConversionRun::new(snapshot.len());
        let cancel = run.cancel_handle();
        info!(run_id = %run.id(), files = run.total(), "conversion run started");
        self.transition(RunState::Running);

        let deadline = self.config.timeout();
        let result =
            tokio::time::timeout(deadline, self.execute(&mut run, snapshot, settings)).await;

        let outcome = match result {
            Ok(Ok(composed)) => match self.deliver(&run, composed).await {
                Ok(report) => {
                    info!(
                        run_id = %report.run_id,
                        pages = report.pages,
                        skipped = report.skipped.len(),
                        file = %report.link.filename,
                        "conversion run completed"
                    );
                    self.observer.on_notice(&Notice::merge_complete());
                    RunOutcome::Completed(report)
                }
                Err(err) => self.failed(&run, err),
            },
            Ok(Err(err)) => self.failed(&run, err),
            Err(_) => {
                cancel.store(true, Ordering::Release);
                error!(
                    run_id = %run.id(),
                    timeout_secs = deadline.as_secs(),
                    processed = run.processed(),
                    "conversion run timed out"
                );
                self.observer.on_notice(&Notice::timed_out());
                let reset_after = self.config.reset_delay();
                self.observer.on_reset_scheduled(reset_after);
                RunOutcome::TimedOut { reset_after }
            }
        };

        self.transition(outcome.state());
        self.teardown(settings);
        Ok(outcome)
    }

    fn failed(&self, run: &ConversionRun, err: PdfMergeError) -> RunOutcome {
        error!(run_id = %run.id(), %err, "conversion run failed");
        self.observer.on_notice(&notice_for_error(&err));
        RunOutcome::Failed {
            message: err.to_string(),
        }
    }

    fn teardown(&self, settings: &mut MergeSettings) {
        settings.add_watermark = false;
        self.observer.on_progress_reset();
        self.transition(RunState::Idle);
        debug!("teardown complete");
    }

    #[instrument(skip_all, fields(run_id = %run.id(), total = run.total()))]
    async fn execute(
        &self,
        run: &mut ConversionRun,
        files: Vec<PendingFile>,
        settings: &MergeSettings,
    ) -> Result<ComposedOutput> {
        let options = settings.conversion_options()?;
        let fonts = load_font_set(&options.fonts).await?;
        let mut composer = PageComposer::new(options, fonts);
        let total = run.total();
        let pause = self.config.chunk_pause();
        let mut skipped = Vec::new();

        for (index, chunk) in files.chunks(self.config.chunk_size).enumerate() {
            for file in chunk {
                if run.is_cancelled() {
                    return Err(PdfMergeError::Cancelled);
                }
                if let Err(err) = self.convert_file(run, &mut composer, file).await {
                    let reason = err.to_string();
                    warn!(file = %file.name(), %reason, "file skipped");
                    self.observer.on_file_skipped(file.name(), &reason);
                    skipped.push(SkippedFile {
                        name: file.name().to_string(),
                        reason,
                    });
                }
                run.record_processed();
            }

            debug!(chunk = index + 1, processed = run.processed(), total, "chunk complete");
            self.observer.on_progress(run.processed(), total);
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        if composer.page_count() == 0 {
            return Err(PdfMergeError::PdfError(
                "none of the selected files could be converted".into(),
            ));
        }

        let watermarked_pages = composer.apply_watermark()?;
        let pages = composer.page_count();
        let bytes = composer.finish()?;

        Ok(ComposedOutput {
            bytes,
            pages,
            watermarked_pages,
            skipped,
        })
    }

    /// Hand the finished document to the sink.
    ///
    /// Runs only after `execute` has beaten the deadline, so a timed-out
    /// run never reaches the sink.
    async fn deliver(&self, run: &ConversionRun, composed: ComposedOutput) -> Result<RunReport> {
        let ComposedOutput {
            bytes,
            pages,
            watermarked_pages,
            skipped,
        } = composed;
        let filename = artifact_filename(Utc::now());
        let sink = Arc::clone(&self.sink);
        let link = blocking(move || sink.deliver(&filename, bytes)).await?;

        Ok(RunReport {
            run_id: run.id(),
            link,
            pages,
            image_pages: run.image_pages(),
            watermarked_pages,
            skipped,
        })
    }

    /// Add the pages for one input file.
    #[instrument(skip_all, fields(file = %file.name(), kind = ?file.kind()))]
    async fn convert_file(
        &self,
        run: &mut ConversionRun,
        composer: &mut PageComposer,
        file: &PendingFile,
    ) -> Result<()> {
        let cancel = run.cancel_handle();
        let bytes = file.shared_bytes();

        if file.kind().is_image() {
            let page_spec: PageSpec = composer.page_spec();
            let needs_details = composer.options().needs_details();
            let include_hash = composer.options().print_hash;
            let kind = file.kind();
            let normalizer = self.normalizer.clone();
            let extractor = self.extractor.clone();

            let (raster, details) = blocking(move || {
                ensure_live(&cancel)?;
                let raster = normalizer.resample(&bytes, &page_spec)?;
                let details = if needs_details {
                    extractor.extract_from(kind, &bytes, include_hash)
                } else {
                    ImageDetails::default()
                };
                Ok((raster, details))
            })
            .await?;

            let number = run.next_image_number();
            composer.add_image_page(file.name(), &raster, &details, number);
        } else {
            ensure_live(&cancel)?;
            let source = ForeignDocument::load(&bytes)?;
            let copied = composer.add_pdf_pages(&source)?;
            debug!(copied, "PDF pages appended");
        }
        Ok(())
    }
}

fn ensure_live(cancel: &AtomicBool) -> Result<()> {
    if cancel.load(Ordering::Acquire) {
        return Err(PdfMergeError::Cancelled);
    }
    Ok(())
}

/// Run CPU-bound work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| PdfMergeError::PdfError(format!("worker task failed: {}", err)))?
}
