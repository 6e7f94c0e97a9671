// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page composer: turns normalised inputs into output pages.
//
// Image pages get the resampled JPEG centred in the margin box, an optional
// detail block at the top, and an optional `Image <n>` stamp. PDF inputs are
// copied page for page. The watermark is a final pass over every page.

use pdfmerge_core::error::Result;
use pdfmerge_core::format::format_capture_time;
use pdfmerge_core::{ConversionOptions, ImageDetails, PageSpec, Rgb, StandardFont};
use tracing::{debug, info, instrument};

use crate::image::RasterBytes;
use crate::layout::{
    DETAIL_TOP_OFFSET, LINE_HEIGHT, MARGIN_X, STAMP_INSET, TEXT_SIZE, fit_image, place_watermark,
    wrap_words,
};
use crate::pdf::{EmbeddedFont, ForeignDocument, LoadedFont, OutputDocument, PageCanvas, PageRef, TextStyle};

/// The three faces used on output pages.
#[derive(Debug, Clone)]
pub struct FontSet {
    pub regular: LoadedFont,
    pub bold: LoadedFont,
    pub black: LoadedFont,
}

impl FontSet {
    /// Helvetica for body text, Helvetica-Bold for names and the watermark.
    pub fn standard() -> Self {
        Self {
            regular: LoadedFont::standard(StandardFont::Helvetica),
            bold: LoadedFont::standard(StandardFont::HelveticaBold),
            black: LoadedFont::standard(StandardFont::HelveticaBold),
        }
    }
}

/// One line of the detail block before wrapping.
#[derive(Debug, Clone, PartialEq)]
struct DetailLine {
    text: String,
    bold: bool,
}

/// Detail block contents in print order.
fn detail_lines(name: &str, details: &ImageDetails, options: &ConversionOptions) -> Vec<DetailLine> {
    let mut lines = Vec::new();
    if options.print_details {
        lines.push(DetailLine {
            text: name.to_string(),
            bold: true,
        });
        if let Some(raw) = &details.capture_time {
            lines.push(DetailLine {
                text: format_capture_time(raw),
                bold: false,
            });
        }
        if let Some(gps) = details.gps_label() {
            lines.push(DetailLine {
                text: format!("GPS (Lat, Long) {gps}"),
                bold: false,
            });
        }
    }
    if options.print_hash
        && let Some(hash) = &details.content_hash_hex
    {
        lines.push(DetailLine {
            text: format!("SHA-256: {hash}"),
            bold: false,
        });
    }
    lines
}

/// Lays out pages of one output document.
pub struct PageComposer {
    output: OutputDocument,
    options: ConversionOptions,
    page_spec: PageSpec,
    regular: EmbeddedFont,
    bold: EmbeddedFont,
    black: EmbeddedFont,
}

impl PageComposer {
    pub fn new(options: ConversionOptions, fonts: FontSet) -> Self {
        let mut output = OutputDocument::new();
        let regular = output.embed_font(fonts.regular);
        let bold = output.embed_font(fonts.bold);
        let black = output.embed_font(fonts.black);
        let page_spec = options.page_spec();
        Self {
            output,
            options,
            page_spec,
            regular,
            bold,
            black,
        }
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    pub fn page_spec(&self) -> PageSpec {
        self.page_spec
    }

    pub fn page_count(&self) -> usize {
        self.output.page_count()
    }

    // -- Image pages ----------------------------------------------------------

    /// Add one page holding `raster`, annotated per the run options.
    /// `image_number` is the 1-based position among image pages of the run.
    #[instrument(skip(self, raster, details), fields(file = %name, image_number))]
    pub fn add_image_page(
        &mut self,
        name: &str,
        raster: &RasterBytes,
        details: &ImageDetails,
        image_number: u32,
    ) -> PageRef {
        let PageSpec {
            width_pt: width,
            height_pt: height,
            ..
        } = self.page_spec;
        let image = self.output.embed_jpeg(raster);
        let mut canvas = PageCanvas::new();

        self.draw_detail_block(&mut canvas, name, details);
        if self.options.print_page_numbers {
            let stamp = format!("Image {image_number}");
            let stamp_width = self.regular.width_of_text_at_size(&stamp, TEXT_SIZE);
            canvas.draw_text(
                &stamp,
                width - stamp_width - STAMP_INSET,
                STAMP_INSET,
                TextStyle::plain(&self.regular, TEXT_SIZE, Rgb::BLACK),
            );
        }

        let rect = fit_image(
            f64::from(raster.width),
            f64::from(raster.height),
            &self.page_spec,
            self.options.print_details,
        );
        canvas.draw_image(&image, rect);
        debug!(x = rect.x, y = rect.y, w = rect.width, h = rect.height, "image placed");

        self.output.add_page(width, height, canvas)
    }

    /// Draw the detail block, advancing the cursor past wrapped lines so
    /// consecutive items never overlap.
    fn draw_detail_block(&self, canvas: &mut PageCanvas, name: &str, details: &ImageDetails) {
        let max_width = self.page_spec.width_pt - 2.0 * MARGIN_X;
        let mut cursor = self.page_spec.height_pt - DETAIL_TOP_OFFSET;

        for line in detail_lines(name, details, &self.options) {
            let font = if line.bold { &self.bold } else { &self.regular };
            cursor -= LINE_HEIGHT;
            let wrapped = wrap_words(&line.text, max_width, |s| {
                font.width_of_text_at_size(s, TEXT_SIZE)
            });
            for (index, text) in wrapped.iter().enumerate() {
                canvas.draw_text(
                    text,
                    MARGIN_X,
                    cursor - index as f64 * LINE_HEIGHT,
                    TextStyle::plain(font, TEXT_SIZE, Rgb::BLACK),
                );
            }
            cursor -= (wrapped.len().saturating_sub(1)) as f64 * LINE_HEIGHT;
        }
    }

    // -- PDF pages ------------------------------------------------------------

    /// Copy every page of `source` after the pages added so far.
    pub fn add_pdf_pages(&mut self, source: &ForeignDocument) -> Result<usize> {
        source.copy_pages_into(&mut self.output)
    }

    // -- Watermark ------------------------------------------------------------

    /// Stamp the configured watermark on every page; returns the number of
    /// pages stamped (zero when watermarking is off).
    #[instrument(skip(self), fields(pages = self.output.page_count()))]
    pub fn apply_watermark(&mut self) -> Result<usize> {
        let Some(watermark) = self.options.watermark.clone() else {
            return Ok(0);
        };
        let opacity = self.output.opacity_state(watermark.opacity);
        let pages = self.output.pages().to_vec();

        for page in &pages {
            let placement = place_watermark(page.width, page.height, |size| {
                self.black.width_of_text_at_size(&watermark.text, size)
            });
            let mut canvas = PageCanvas::new();
            canvas.draw_text(
                &watermark.text,
                placement.x,
                placement.y,
                TextStyle {
                    font: &self.black,
                    size: placement.font_size,
                    color: watermark.color,
                    rotate_deg: placement.angle_deg,
                    opacity: Some(&opacity),
                },
            );
            self.output.overlay(*page, canvas)?;
        }

        info!(pages = pages.len(), text = %watermark.text, "watermark applied");
        Ok(pages.len())
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise the finished document.
    pub fn finish(self) -> Result<Vec<u8>> {
        self.output.save()
    }
}
