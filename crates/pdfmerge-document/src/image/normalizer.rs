// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image normalizer: decode any supported raster, resample it to the pixel
// budget of the output page at print resolution, flatten transparency, and
// re-encode as JPEG for embedding.

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use pdfmerge_core::PageSpec;
use pdfmerge_core::error::{PdfMergeError, Result};
use tracing::{debug, instrument};

/// Millimetres per inch.
const MM_PER_INCH: f64 = 25.4;

/// A resampled image ready to be embedded as a `DCTDecode` XObject.
#[derive(Debug, Clone)]
pub struct RasterBytes {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

/// Resamples images to fit a page at a fixed print resolution.
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    dpi: f64,
    quality: u8,
    filter: FilterType,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new(300.0, 90)
    }
}

impl ImageNormalizer {
    // -- Construction ---------------------------------------------------------

    /// Normalizer targeting `dpi` with JPEG `quality` (1-100).
    pub fn new(dpi: f64, quality: u8) -> Self {
        Self {
            dpi,
            quality: quality.clamp(1, 100),
            filter: FilterType::Lanczos3,
        }
    }

    /// Use a different resampling filter.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    // -- Geometry -------------------------------------------------------------

    /// Pixel budget `(max_w, max_h)` for a page at this normalizer's resolution.
    pub fn pixel_budget(&self, page: &PageSpec) -> (f64, f64) {
        let (w_mm, h_mm) = page.size_mm();
        (
            w_mm * self.dpi / MM_PER_INCH,
            h_mm * self.dpi / MM_PER_INCH,
        )
    }

    // -- Resampling -----------------------------------------------------------

    /// Decode `data`, fit it to `page`, and encode the result as JPEG.
    #[instrument(skip(self, data, page), fields(data_len = data.len(), dpi = self.dpi))]
    pub fn resample(&self, data: &[u8], page: &PageSpec) -> Result<RasterBytes> {
        let decoded = image::load_from_memory(data)
            .map_err(|err| PdfMergeError::ImageError(format!("failed to decode image: {}", err)))?;

        let (max_w, max_h) = self.pixel_budget(page);
        let (width, height) = fit_dimensions(decoded.width(), decoded.height(), max_w, max_h);

        debug!(
            from_w = decoded.width(),
            from_h = decoded.height(),
            to_w = width,
            to_h = height,
            "resampling image"
        );

        let flattened = flatten_onto_white(&decoded);
        let resized = image::imageops::resize(&flattened, width, height, self.filter);

        let mut jpeg = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, self.quality);
        resized
            .write_with_encoder(encoder)
            .map_err(|err| PdfMergeError::ImageError(format!("JPEG encoding failed: {}", err)))?;

        debug!(jpeg_bytes = jpeg.len(), "image resampled");
        Ok(RasterBytes {
            width,
            height,
            jpeg,
        })
    }
}

/// Scale `(width, height)` by `min(max_w / width, max_h / height)`.
///
/// The factor may exceed 1, so small images are enlarged to the budget.
/// Results are rounded and never drop below one pixel.
pub fn fit_dimensions(width: u32, height: u32, max_w: f64, max_h: f64) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width.max(1), height.max(1));
    }
    let scale = (max_w / f64::from(width)).min(max_h / f64::from(height));
    let scaled = |v: u32| ((f64::from(v) * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

/// Composite any alpha channel onto an opaque white background.
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let image::Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use pdfmerge_core::{Orientation, PaperSize};
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Vec::new();
        image.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
        buffer
    }

    #[test]
    fn exactly_one_axis_fills_the_budget() {
        let (w, h) = fit_dimensions(4000, 3000, 2480.0, 3508.0);
        assert_eq!(w, 2480);
        assert_eq!(h, 1860);
        let (w, h) = fit_dimensions(1000, 4000, 2480.0, 3508.0);
        assert_eq!(h, 3508);
        assert_eq!(w, 877);
    }

    #[test]
    fn aspect_ratio_is_preserved() {
        for (w, h) in [(640u32, 480u32), (123, 987), (3000, 17), (1, 1)] {
            let (nw, nh) = fit_dimensions(w, h, 1240.0, 1754.0);
            let before = f64::from(w) / f64::from(h);
            let after = f64::from(nw) / f64::from(nh);
            // Rounding to whole pixels bounds the drift.
            let tolerance = before * (1.0 / f64::from(nw.min(nh)) + 1e-9) * 2.0;
            assert!((before - after).abs() <= tolerance, "{w}x{h} -> {nw}x{nh}");
        }
    }

    #[test]
    fn small_images_are_enlarged() {
        let (w, h) = fit_dimensions(10, 10, 100.0, 200.0);
        assert_eq!((w, h), (100, 100));
    }

    #[test]
    fn a4_budget_at_300_dpi() {
        let normalizer = ImageNormalizer::default();
        let (w, h) = normalizer.pixel_budget(&PageSpec::default());
        assert!((w - 2480.3).abs() < 0.1);
        assert!((h - 3507.9).abs() < 0.1);
    }

    #[test]
    fn resample_produces_jpeg_within_budget() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, image::Rgb([200, 10, 10])));
        let png = encode(img, ImageFormat::Png);
        let normalizer = ImageNormalizer::new(10.0, 90);
        let page = PageSpec::new(PaperSize::A4, Orientation::Landscape);

        let raster = normalizer.resample(&png, &page).unwrap();
        let (max_w, max_h) = normalizer.pixel_budget(&page);
        assert!(f64::from(raster.width) <= max_w.round());
        assert!(f64::from(raster.height) <= max_h.round());
        assert_eq!(&raster.jpeg[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&raster.jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (raster.width, raster.height));
    }

    #[test]
    fn transparency_is_flattened_to_white() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0])));
        let flat = flatten_onto_white(&img);
        assert_eq!(flat.get_pixel(0, 0), &image::Rgb([255, 255, 255]));

        let opaque = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 255])));
        assert_eq!(flatten_onto_white(&opaque).get_pixel(0, 0), &image::Rgb([10, 20, 30]));
    }

    #[test]
    fn undecodable_bytes_are_an_image_error() {
        let err = ImageNormalizer::default()
            .resample(b"not an image", &PageSpec::default())
            .unwrap_err();
        assert!(matches!(err, PdfMergeError::ImageError(_)));
    }
}
