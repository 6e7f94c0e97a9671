// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfmerge-document: document assembly for PDFMerge.
//
// Provides the output PDF writer and foreign-page import (lopdf), fit-to-page
// image resampling, EXIF/GPS metadata and content digests, text layout and
// watermark geometry, and the page composer that ties them together.

pub mod compose;
pub mod image;
pub mod integrity;
pub mod layout;
pub mod metadata;
pub mod pdf;

// Re-export the primary types so callers can use `pdfmerge_document::PageComposer` etc.
pub use compose::{FontSet, PageComposer};
pub use crate::image::{ImageNormalizer, RasterBytes};
pub use integrity::content_digest;
pub use metadata::{ExifTagReader, MetadataExtractor, TagReader, TagValue};
pub use pdf::{ForeignDocument, LoadedFont, OutputDocument};
