// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the pdfmerge-document crate: fit-to-page
// resampling of a synthetic photo and greedy wrapping of a long detail line.

use std::io::Cursor;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use pdfmerge_core::{PageSpec, StandardFont};
use pdfmerge_document::layout::wrap_words;
use pdfmerge_document::{ImageNormalizer, LoadedFont};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Resample a 640x480 gradient PNG onto A4 at 72 DPI.
///
/// Full print resolution (300 DPI) is dominated by the Lanczos kernel on a
/// ~9 megapixel output; 72 DPI keeps iterations short while exercising the
/// same decode, flatten, resize, and encode path.
fn bench_resample(c: &mut Criterion) {
    let img = RgbImage::from_fn(640, 480, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    let normalizer = ImageNormalizer::new(72.0, 90);
    let page = PageSpec::default();

    c.bench_function("resample 640x480 -> A4 @72dpi", |b| {
        b.iter(|| {
            let raster = normalizer.resample(black_box(&png), &page).unwrap();
            black_box(raster.jpeg.len());
        });
    });
}

/// Wrap a 200-word line with Helvetica metrics at 10pt.
fn bench_wrap(c: &mut Criterion) {
    let font = LoadedFont::standard(StandardFont::Helvetica);
    let text = vec!["IMG_20240115_143000.jpg"; 200].join(" ");

    c.bench_function("wrap 200 words", |b| {
        b.iter(|| {
            let lines = wrap_words(black_box(&text), 535.28, |s| font.width_of_text_at_size(s, 10.0));
            black_box(lines.len());
        });
    });
}

criterion_group!(benches, bench_resample, bench_wrap);
criterion_main!(benches);
