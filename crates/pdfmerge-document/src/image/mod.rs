// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: fit-to-page resampling and JPEG normalisation.

pub mod normalizer;

pub use normalizer::{ImageNormalizer, RasterBytes};
