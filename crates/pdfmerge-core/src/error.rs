// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for PDFMerge.

use thiserror::Error;

/// Top-level error type for all PDFMerge operations.
#[derive(Debug, Error)]
pub enum PdfMergeError {
    // -- Admission errors --
    #[error("unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("a file named {0} is already in the list")]
    DuplicateFile(String),

    #[error("{name} is too large ({size} bytes, limit {limit} bytes)")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    // -- Run preconditions --
    #[error("no files selected")]
    EmptyFileSet,

    #[error("a conversion is already running")]
    RunInProgress,

    #[error("conversion cancelled")]
    Cancelled,

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("font loading failed: {0}")]
    FontError(String),

    // -- Settings / delivery --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("artifact delivery failed: {0}")]
    Artifact(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PdfMergeError>;
