// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Settings and tuning.
//
// `MergeSettings` is the persisted, user-editable record (checkbox state and
// watermark fields). Each run takes an immutable `ConversionOptions` snapshot
// of it, so nothing read during a run can change underneath the pipeline.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PdfMergeError, Result};
use crate::types::{Orientation, PageSpec, PaperSize};

/// Watermark text used when the user leaves the field empty.
pub const DEFAULT_WATERMARK_TEXT: &str = "PDFMerge";

/// Watermark colour used when the user leaves the field empty.
pub const DEFAULT_WATERMARK_COLOR: &str = "#000000";

/// Watermark opacity used when none is configured.
pub const DEFAULT_WATERMARK_OPACITY: f64 = 0.5;

/// PDF standard fonts available without an embedded font program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// PostScript name used as the PDF `/BaseFont`.
    pub fn base_font(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }
}

/// Where a font comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontSource {
    /// A PDF standard font; nothing to load.
    Builtin(StandardFont),
    /// A TrueType file read at run start and embedded into the output.
    File(PathBuf),
}

/// The three faces used on output pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSettings {
    /// Body text of the detail block and page stamps.
    pub regular: FontSource,
    /// File name line of the detail block.
    pub bold: FontSource,
    /// Watermark banner.
    pub black: FontSource,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            regular: FontSource::Builtin(StandardFont::Helvetica),
            bold: FontSource::Builtin(StandardFont::HelveticaBold),
            black: FontSource::Builtin(StandardFont::HelveticaBold),
        }
    }
}

/// Normalised RGB colour, each channel in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Parse `#rrggbb` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PdfMergeError::InvalidConfig(format!(
                "colour must be #rrggbb, got {hex:?}"
            )));
        }
        let value = u32::from_str_radix(digits, 16)
            .map_err(|err| PdfMergeError::InvalidConfig(format!("colour {hex:?}: {err}")))?;
        let channel = |shift: u32| f64::from((value >> shift) & 0xff) / 255.0;
        Ok(Self {
            r: channel(16),
            g: channel(8),
            b: channel(0),
        })
    }
}

/// Validated watermark parameters for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkOptions {
    pub text: String,
    pub color: Rgb,
    pub opacity: f64,
}

/// Persistent user settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    /// Print file name, capture time, and GPS above each image.
    pub print_image_details: bool,
    /// Stamp `Image <n>` in the bottom-right corner of each image page.
    pub print_image_page_numbers: bool,
    /// Print the SHA-256 of each image file.
    pub print_image_hash: bool,
    /// Lay image pages out in landscape.
    pub landscape_orientation: bool,
    /// Stamp a diagonal watermark on every page. Cleared after every run.
    pub add_watermark: bool,
    pub watermark_text: String,
    pub watermark_color: String,
    pub watermark_opacity: f64,
    pub paper_size: PaperSize,
    pub fonts: FontSettings,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            print_image_details: false,
            print_image_page_numbers: false,
            print_image_hash: false,
            landscape_orientation: false,
            add_watermark: false,
            watermark_text: String::new(),
            watermark_color: DEFAULT_WATERMARK_COLOR.to_string(),
            watermark_opacity: DEFAULT_WATERMARK_OPACITY,
            paper_size: PaperSize::A4,
            fonts: FontSettings::default(),
        }
    }
}

impl MergeSettings {
    /// Validate the settings and freeze them into the options for one run.
    pub fn conversion_options(&self) -> Result<ConversionOptions> {
        let watermark = if self.add_watermark {
            Some(self.watermark_options()?)
        } else {
            None
        };
        Ok(ConversionOptions {
            print_details: self.print_image_details,
            print_page_numbers: self.print_image_page_numbers,
            print_hash: self.print_image_hash,
            landscape: self.landscape_orientation,
            paper_size: self.paper_size,
            watermark,
            fonts: self.fonts.clone(),
        })
    }

    fn watermark_options(&self) -> Result<WatermarkOptions> {
        let text = match self.watermark_text.trim() {
            "" => DEFAULT_WATERMARK_TEXT.to_string(),
            _ => self.watermark_text.clone(),
        };
        let color = match self.watermark_color.trim() {
            "" => Rgb::BLACK,
            hex => Rgb::from_hex(hex)?,
        };
        let opacity = self.watermark_opacity;
        if !(0.0..=1.0).contains(&opacity) {
            return Err(PdfMergeError::InvalidConfig(format!(
                "watermark opacity must be between 0 and 1, got {opacity}"
            )));
        }
        Ok(WatermarkOptions {
            text,
            color,
            opacity,
        })
    }
}

/// Immutable options consumed by one conversion run.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    pub print_details: bool,
    pub print_page_numbers: bool,
    pub print_hash: bool,
    pub landscape: bool,
    pub paper_size: PaperSize,
    pub watermark: Option<WatermarkOptions>,
    pub fonts: FontSettings,
}

impl ConversionOptions {
    /// Geometry of image pages for this run.
    pub fn page_spec(&self) -> PageSpec {
        let orientation = if self.landscape {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };
        PageSpec::new(self.paper_size, orientation)
    }

    /// Whether any annotation needs image metadata to be extracted.
    pub fn needs_details(&self) -> bool {
        self.print_details || self.print_hash
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            print_details: false,
            print_page_numbers: false,
            print_hash: false,
            landscape: false,
            paper_size: PaperSize::A4,
            watermark: None,
            fonts: FontSettings::default(),
        }
    }
}

/// Pipeline tuning constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Files processed between progress updates.
    pub chunk_size: usize,
    /// Pause after each chunk, in milliseconds.
    pub chunk_pause_ms: u64,
    /// Deadline for a whole run, in seconds.
    pub timeout_secs: u64,
    /// Delay before the presentation layer resets after a timeout, in milliseconds.
    pub reset_delay_ms: u64,
    /// Print resolution used to size resampled images.
    pub raster_dpi: f64,
    /// JPEG quality (1-100) of resampled images.
    pub jpeg_quality: u8,
    /// How long a delivered artifact link stays valid, in seconds.
    pub link_lifetime_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            chunk_pause_ms: 500,
            timeout_secs: 60,
            reset_delay_ms: 3000,
            raster_dpi: 300.0,
            jpeg_quality: 90,
            link_lifetime_secs: 60,
        }
    }
}

impl PipelineConfig {
    pub fn chunk_pause(&self) -> Duration {
        Duration::from_millis(self.chunk_pause_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    pub fn link_lifetime(&self) -> Duration {
        Duration::from_secs(self.link_lifetime_secs)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(PdfMergeError::InvalidConfig(
                "chunk size must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(PdfMergeError::InvalidConfig(format!(
                "JPEG quality must be 1-100, got {}",
                self.jpeg_quality
            )));
        }
        if !(self.raster_dpi.is_finite() && self.raster_dpi > 0.0) {
            return Err(PdfMergeError::InvalidConfig(format!(
                "raster DPI must be positive, got {}",
                self.raster_dpi
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colours_normalise() {
        let red = Rgb::from_hex("#ff0000").unwrap();
        assert_eq!(red, Rgb { r: 1.0, g: 0.0, b: 0.0 });
        let grey = Rgb::from_hex("808080").unwrap();
        assert!((grey.g - 128.0 / 255.0).abs() < 1e-12);
        assert!(Rgb::from_hex("#fff").is_err());
        assert!(Rgb::from_hex("#zzzzzz").is_err());
    }

    #[test]
    fn watermark_disabled_yields_no_options() {
        let settings = MergeSettings::default();
        let options = settings.conversion_options().unwrap();
        assert!(options.watermark.is_none());
    }

    #[test]
    fn empty_watermark_fields_fall_back() {
        let settings = MergeSettings {
            add_watermark: true,
            watermark_text: "   ".into(),
            watermark_color: String::new(),
            ..Default::default()
        };
        let watermark = settings.conversion_options().unwrap().watermark.unwrap();
        assert_eq!(watermark.text, DEFAULT_WATERMARK_TEXT);
        assert_eq!(watermark.color, Rgb::BLACK);
        assert_eq!(watermark.opacity, DEFAULT_WATERMARK_OPACITY);
    }

    #[test]
    fn out_of_range_opacity_rejected() {
        let settings = MergeSettings {
            add_watermark: true,
            watermark_opacity: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            settings.conversion_options(),
            Err(PdfMergeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn landscape_flag_swaps_page_spec() {
        let settings = MergeSettings {
            landscape_orientation: true,
            ..Default::default()
        };
        let spec = settings.conversion_options().unwrap().page_spec();
        assert!(spec.width_pt > spec.height_pt);
        assert_eq!(spec.orientation, Orientation::Landscape);
    }

    #[test]
    fn settings_deserialise_with_missing_fields() {
        let settings: MergeSettings =
            serde_json::from_str(r#"{"print_image_hash": true}"#).unwrap();
        assert!(settings.print_image_hash);
        assert_eq!(settings.paper_size, PaperSize::A4);
        assert_eq!(settings.fonts, FontSettings::default());
    }

    #[test]
    fn pipeline_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 5);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        let bad = PipelineConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
