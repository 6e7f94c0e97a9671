// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page layout geometry: the image margin box, greedy word wrapping, and the
// diagonal watermark banner. Everything here is pure arithmetic over point
// coordinates with the origin at the bottom-left of the page.

use pdfmerge_core::PageSpec;

/// Left and right margin around the image box.
pub const MARGIN_X: f64 = 30.0;
/// Top and bottom margin around the image box.
pub const MARGIN_Y: f64 = 40.0;
/// Height taken from the image box when the detail block is printed.
pub const DETAIL_RESERVE: f64 = 100.0;

/// Font size of detail lines and page stamps.
pub const TEXT_SIZE: f64 = 10.0;
/// Distance between baselines of detail lines.
pub const LINE_HEIGHT: f64 = 14.0;
/// The detail cursor starts this far below the top edge.
pub const DETAIL_TOP_OFFSET: f64 = 20.0;
/// Page stamp offset from the right and bottom edges.
pub const STAMP_INSET: f64 = 30.0;

/// Watermark search starts above this size.
pub const WATERMARK_SEARCH_START: f64 = 10.0;
/// Largest watermark size; reached when even this does not span the page.
pub const WATERMARK_MAX_SIZE: f64 = 100.0;

/// An axis-aligned rectangle in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Place an image of `img_w` x `img_h` inside the page's margin box.
///
/// The image is scaled to fit the box (up or down). When `reserve_details`
/// is set the box loses [`DETAIL_RESERVE`] points of height, but the image is
/// still centred vertically within the full margin box.
pub fn fit_image(img_w: f64, img_h: f64, page: &PageSpec, reserve_details: bool) -> Rect {
    let box_w = page.width_pt - 2.0 * MARGIN_X;
    let full_box_h = page.height_pt - 2.0 * MARGIN_Y;
    let box_h = if reserve_details {
        full_box_h - DETAIL_RESERVE
    } else {
        full_box_h
    };

    let scale = if img_w > 0.0 && img_h > 0.0 {
        (box_w / img_w).min(box_h / img_h).max(0.0)
    } else {
        0.0
    };
    let width = img_w * scale;
    let height = img_h * scale;

    Rect {
        x: (box_w - width) / 2.0 + MARGIN_X,
        y: (full_box_h - height) / 2.0 + MARGIN_Y,
        width,
        height,
    }
}

/// Greedy single-pass word wrap.
///
/// Words are separated by single spaces. A word joins the current line unless
/// the joined line would be wider than `max_width` and the line already holds
/// a word; then the line is emitted and the word starts the next one. Text
/// that fits comes back as exactly one line equal to the input.
pub fn wrap_words(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for (index, word) in text.split(' ').enumerate() {
        if index == 0 {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{line} {word}");
        if measure(&candidate) > max_width {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }
    lines.push(line);
    lines
}

/// Smallest size above [`WATERMARK_SEARCH_START`] at which the text is at
/// least `page_width` wide, capped at [`WATERMARK_MAX_SIZE`].
///
/// `width_at` returns the text width at a given size.
pub fn watermark_font_size(page_width: f64, width_at: impl Fn(f64) -> f64) -> f64 {
    let mut size = WATERMARK_SEARCH_START;
    loop {
        size += 1.0;
        if width_at(size) >= page_width || size >= WATERMARK_MAX_SIZE {
            return size;
        }
    }
}

/// Where and how the watermark banner is drawn on one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkPlacement {
    pub font_size: f64,
    pub x: f64,
    pub y: f64,
    /// Rotation in degrees, counter-clockwise positive. Always negative: the
    /// banner runs from upper left to lower right.
    pub angle_deg: f64,
}

/// Lay the watermark along the page diagonal.
///
/// The angle is `atan(H / W)`; the start point centres the rotated text's
/// baseline on the page.
pub fn place_watermark(page_width: f64, page_height: f64, width_at: impl Fn(f64) -> f64) -> WatermarkPlacement {
    let font_size = watermark_font_size(page_width, &width_at);
    let theta = (page_height / page_width).atan();
    let text_width = width_at(font_size);
    WatermarkPlacement {
        font_size,
        x: (page_width - text_width * theta.cos()) / 2.0,
        y: (page_height + text_width * theta.sin()) / 2.0,
        angle_deg: -theta.to_degrees(),
    }
}
