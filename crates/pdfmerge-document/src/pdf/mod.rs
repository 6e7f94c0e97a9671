// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: fonts, the output document writer, and foreign-page import.

pub mod font;
pub mod reader;
pub mod writer;

pub use font::LoadedFont;
pub use reader::ForeignDocument;
pub use writer::{EmbeddedFont, EmbeddedImage, OpacityState, OutputDocument, PageCanvas, PageRef, TextStyle};
