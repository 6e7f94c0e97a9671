// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for PDFMerge.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::format::format_file_size;

/// PostScript points per millimetre.
pub const PT_PER_MM: f64 = 72.0 / 25.4;

/// Largest accepted non-PDF input (50 MiB).
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Unique identifier for one conversion run (used in log spans).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported input file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    Pdf,
    Jpg,
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl FileKind {
    /// Infer the kind from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" => Some(Self::Jpg),
            "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Infer the kind from the text after the final `.` of a file name.
    ///
    /// A name without any `.` is treated as if the whole name were the
    /// extension, so `"pdf"` on its own is accepted as a PDF.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = name.rsplit('.').next().unwrap_or(name);
        Self::from_extension(ext)
    }

    /// Raster image types (everything except PDF).
    pub fn is_image(&self) -> bool {
        !matches!(self, Self::Pdf)
    }

    /// Whether the format can carry EXIF capture metadata.
    pub fn carries_exif(&self) -> bool {
        matches!(self, Self::Jpg | Self::Jpeg | Self::Png)
    }

    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpg | Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }
}

/// Icon shown next to a file in the selection list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileIcon {
    Image,
    Document,
}

/// A validated input file waiting to be merged.
///
/// Only [`crate::OrderedFileSet`] creates these; the raw bytes are shared so
/// snapshots handed to the pipeline are cheap.
#[derive(Debug, Clone)]
pub struct PendingFile {
    name: String,
    size_bytes: u64,
    kind: FileKind,
    bytes: Arc<[u8]>,
}

impl PendingFile {
    pub(crate) fn new(name: String, size_bytes: u64, kind: FileKind, bytes: Arc<[u8]>) -> Self {
        Self {
            name,
            size_bytes,
            kind,
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the raw bytes, for moving work onto blocking threads.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn icon(&self) -> FileIcon {
        if self.kind.is_image() {
            FileIcon::Image
        } else {
            FileIcon::Document
        }
    }

    /// List label, e.g. `holiday.jpg (2 MB)`.
    pub fn display_label(&self) -> String {
        format!("{} ({})", self.name, format_file_size(self.size_bytes))
    }
}

/// Paper profiles, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    A0,
    A1,
    A2,
    A3,
    #[default]
    A4,
}

impl PaperSize {
    /// Dimensions in millimetres (width, height), portrait.
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A0 => (841, 1189),
            Self::A1 => (594, 841),
            Self::A2 => (420, 594),
            Self::A3 => (297, 420),
            Self::A4 => (210, 297),
        }
    }

    /// Look up a profile by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "A0" => Some(Self::A0),
            "A1" => Some(Self::A1),
            "A2" => Some(Self::A2),
            "A3" => Some(Self::A3),
            "A4" => Some(Self::A4),
            _ => None,
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Output page geometry for image pages, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSpec {
    pub width_pt: f64,
    pub height_pt: f64,
    pub orientation: Orientation,
}

impl PageSpec {
    /// Derive the page geometry from a paper profile; landscape swaps the axes.
    pub fn new(paper: PaperSize, orientation: Orientation) -> Self {
        let (w_mm, h_mm) = paper.dimensions_mm();
        let (w_pt, h_pt) = (f64::from(w_mm) * PT_PER_MM, f64::from(h_mm) * PT_PER_MM);
        let (width_pt, height_pt) = match orientation {
            Orientation::Portrait => (w_pt, h_pt),
            Orientation::Landscape => (h_pt, w_pt),
        };
        Self {
            width_pt,
            height_pt,
            orientation,
        }
    }

    /// Physical size in millimetres (width, height) in the page's orientation.
    pub fn size_mm(&self) -> (f64, f64) {
        (self.width_pt / PT_PER_MM, self.height_pt / PT_PER_MM)
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::new(PaperSize::A4, Orientation::Portrait)
    }
}

/// Metadata derived from one image file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageDetails {
    /// Decimal degrees (latitude, longitude).
    pub gps: Option<(f64, f64)>,
    /// Raw EXIF date string, `YYYY:MM:DD HH:MM:SS`.
    pub capture_time: Option<String>,
    /// Lowercase hex SHA-256 of the raw file bytes.
    pub content_hash_hex: Option<String>,
}

impl ImageDetails {
    /// `lat, lon` with six decimals, if GPS data is present.
    pub fn gps_label(&self) -> Option<String> {
        self.gps.map(|(lat, lon)| format!("{lat:.6}, {lon:.6}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_name_uses_final_extension() {
        assert_eq!(FileKind::from_name("scan.final.PDF"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_name("IMG_0001.JPeG"), Some(FileKind::Jpeg));
        assert_eq!(FileKind::from_name("archive.pdf.zip"), None);
        assert_eq!(FileKind::from_name("notes.txt"), None);
    }

    #[test]
    fn exif_capable_kinds() {
        assert!(FileKind::Jpg.carries_exif());
        assert!(FileKind::Png.carries_exif());
        assert!(!FileKind::Gif.carries_exif());
        assert!(!FileKind::Webp.carries_exif());
        assert!(!FileKind::Pdf.is_image());
    }

    #[test]
    fn a4_portrait_in_points() {
        let spec = PageSpec::new(PaperSize::A4, Orientation::Portrait);
        assert!((spec.width_pt - 595.28).abs() < 0.01);
        assert!((spec.height_pt - 841.89).abs() < 0.01);
    }

    #[test]
    fn landscape_swaps_axes() {
        let spec = PageSpec::new(PaperSize::A3, Orientation::Landscape);
        let (w_mm, h_mm) = spec.size_mm();
        assert!((w_mm - 420.0).abs() < 1e-9);
        assert!((h_mm - 297.0).abs() < 1e-9);
    }

    #[test]
    fn gps_label_has_six_decimals() {
        let details = ImageDetails {
            gps: Some((48.8566666, 2.3522219)),
            ..Default::default()
        };
        assert_eq!(details.gps_label().as_deref(), Some("48.856667, 2.352222"));
    }
}
