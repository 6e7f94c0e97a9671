// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDFMerge: core types, settings, and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod fileset;
pub mod format;
pub mod notice;
pub mod types;

pub use config::{
    ConversionOptions, FontSettings, FontSource, MergeSettings, PipelineConfig, Rgb, StandardFont,
    WatermarkOptions,
};
pub use error::PdfMergeError;
pub use fileset::{AddOutcome, OrderedFileSet, SelectedFile};
pub use notice::{Notice, NoticeLevel, notice_for_error};
pub use types::*;
