// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDFMerge pipeline: drives one conversion run at a time over an ordered
// file set: chunked processing, a hard deadline, observer callbacks, and
// delivery of the finished PDF to an artifact sink.

pub mod artifact;
pub mod fonts;
pub mod observer;
pub mod pipeline;
pub mod run;

pub use artifact::{ArtifactLink, ArtifactSink, DirectorySink, MemorySink, artifact_filename};
pub use observer::{NoopObserver, RunObserver, SharedObserver};
pub use pipeline::{BatchPipeline, RunOutcome, RunReport, SkippedFile};
pub use run::{ConversionRun, RunState};
