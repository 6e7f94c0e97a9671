// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image metadata: GPS position, capture time, and content digest.
//
// Tag parsing sits behind the `TagReader` trait so the extractor can be driven
// by a canned tag map in tests. The production reader uses `kamadak-exif`.
// Every fault is absorbed: a missing or malformed tag only leaves the matching
// `ImageDetails` field empty.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use exif::{In, Reader, Tag, Value};
use pdfmerge_core::{FileKind, ImageDetails, PendingFile};
use tracing::{debug, instrument};

use crate::integrity::content_digest;

/// Tag names understood by [`MetadataExtractor`].
pub mod tags {
    pub const GPS_LATITUDE: &str = "GPSLatitude";
    pub const GPS_LATITUDE_REF: &str = "GPSLatitudeRef";
    pub const GPS_LONGITUDE: &str = "GPSLongitude";
    pub const GPS_LONGITUDE_REF: &str = "GPSLongitudeRef";
    pub const DATE_TIME_ORIGINAL: &str = "DateTimeOriginal";
    pub const DATE_TIME: &str = "DateTime";
}

/// Value of a single image tag.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Rationals(Vec<f64>),
    Text(String),
}

/// Tag name to value.
pub type TagMap = HashMap<String, TagValue>;

/// Parses image bytes into a tag map.
///
/// Implementations return an empty map when the bytes carry no readable tags.
pub trait TagReader: Send + Sync {
    fn read_tags(&self, bytes: &[u8]) -> TagMap;
}

/// [`TagReader`] backed by `kamadak-exif`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifTagReader;

impl ExifTagReader {
    const TAGS: [(Tag, &'static str); 6] = [
        (Tag::GPSLatitude, tags::GPS_LATITUDE),
        (Tag::GPSLatitudeRef, tags::GPS_LATITUDE_REF),
        (Tag::GPSLongitude, tags::GPS_LONGITUDE),
        (Tag::GPSLongitudeRef, tags::GPS_LONGITUDE_REF),
        (Tag::DateTimeOriginal, tags::DATE_TIME_ORIGINAL),
        (Tag::DateTime, tags::DATE_TIME),
    ];

    fn convert(value: &Value) -> Option<TagValue> {
        match value {
            Value::Rational(parts) => Some(TagValue::Rationals(
                parts.iter().map(|r| r.to_f64()).collect(),
            )),
            // Read the raw ASCII so EXIF dates keep their `YYYY:MM:DD` layout.
            Value::Ascii(chunks) => chunks.first().map(|raw| {
                TagValue::Text(
                    String::from_utf8_lossy(raw)
                        .trim_end_matches('\0')
                        .trim()
                        .to_string(),
                )
            }),
            _ => None,
        }
    }
}

impl TagReader for ExifTagReader {
    fn read_tags(&self, bytes: &[u8]) -> TagMap {
        let mut cursor = Cursor::new(bytes);
        let exif = match Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => exif,
            Err(err) => {
                debug!(%err, "no readable EXIF block");
                return TagMap::new();
            }
        };

        Self::TAGS
            .iter()
            .filter_map(|(tag, name)| {
                let field = exif.get_field(*tag, In::PRIMARY)?;
                Self::convert(&field.value).map(|value| (name.to_string(), value))
            })
            .collect()
    }
}

/// Derives [`ImageDetails`] from image files.
#[derive(Clone)]
pub struct MetadataExtractor {
    reader: Arc<dyn TagReader>,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new(Arc::new(ExifTagReader))
    }
}

impl std::fmt::Debug for MetadataExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataExtractor").finish_non_exhaustive()
    }
}

impl MetadataExtractor {
    pub fn new(reader: Arc<dyn TagReader>) -> Self {
        Self { reader }
    }

    /// Extract details from a pending file.
    pub fn extract(&self, file: &PendingFile, include_hash: bool) -> ImageDetails {
        self.extract_from(file.kind(), file.bytes(), include_hash)
    }

    /// Extract details from raw bytes of the given kind.
    ///
    /// EXIF is consulted only for kinds that carry it; the digest is computed
    /// over all bytes whenever `include_hash` is set.
    #[instrument(skip(self, bytes), fields(?kind, bytes_len = bytes.len()))]
    pub fn extract_from(&self, kind: FileKind, bytes: &[u8], include_hash: bool) -> ImageDetails {
        let mut details = ImageDetails::default();

        if kind.carries_exif() {
            let tags = self.reader.read_tags(bytes);
            details.gps = gps_position(&tags);
            details.capture_time = capture_time(&tags);
        }
        if include_hash {
            details.content_hash_hex = Some(content_digest(bytes));
        }

        debug!(
            has_gps = details.gps.is_some(),
            has_time = details.capture_time.is_some(),
            hashed = details.content_hash_hex.is_some(),
            "image details extracted"
        );
        details
    }
}

/// Convert a degrees/minutes/seconds triple to decimal degrees.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

fn coordinate(tags: &TagMap, value_tag: &str, ref_tag: &str) -> Option<f64> {
    let TagValue::Rationals(parts) = tags.get(value_tag)? else {
        return None;
    };
    let [deg, min, sec, ..] = parts.as_slice() else {
        return None;
    };
    let decimal = dms_to_decimal(*deg, *min, *sec);
    if !decimal.is_finite() {
        return None;
    }
    let negative = matches!(
        tags.get(ref_tag),
        Some(TagValue::Text(hemisphere)) if hemisphere.starts_with('S') || hemisphere.starts_with('W')
    );
    Some(if negative { -decimal } else { decimal })
}

fn gps_position(tags: &TagMap) -> Option<(f64, f64)> {
    let lat = coordinate(tags, tags::GPS_LATITUDE, tags::GPS_LATITUDE_REF)?;
    let lon = coordinate(tags, tags::GPS_LONGITUDE, tags::GPS_LONGITUDE_REF)?;
    Some((lat, lon))
}

fn capture_time(tags: &TagMap) -> Option<String> {
    [tags::DATE_TIME_ORIGINAL, tags::DATE_TIME]
        .iter()
        .find_map(|name| match tags.get(*name) {
            Some(TagValue::Text(text)) if !text.is_empty() => Some(text.clone()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedTags(TagMap);

    impl TagReader for CannedTags {
        fn read_tags(&self, _bytes: &[u8]) -> TagMap {
            self.0.clone()
        }
    }

    fn extractor(entries: &[(&str, TagValue)]) -> MetadataExtractor {
        let map = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        MetadataExtractor::new(Arc::new(CannedTags(map)))
    }

    fn paris() -> Vec<(&'static str, TagValue)> {
        vec![
            (tags::GPS_LATITUDE, TagValue::Rationals(vec![48.0, 51.0, 24.0])),
            (tags::GPS_LATITUDE_REF, TagValue::Text("N".into())),
            (tags::GPS_LONGITUDE, TagValue::Rationals(vec![2.0, 21.0, 8.0])),
            (tags::GPS_LONGITUDE_REF, TagValue::Text("E".into())),
            (tags::DATE_TIME_ORIGINAL, TagValue::Text("2024:01:15 14:30:00".into())),
        ]
    }

    #[test]
    fn dms_conversion() {
        let lat = dms_to_decimal(48.0, 51.0, 24.0);
        assert_eq!(format!("{lat:.6}"), "48.856667");
    }

    #[test]
    fn gps_and_time_from_jpeg_tags() {
        let details = extractor(&paris()).extract_from(FileKind::Jpg, b"jpeg", false);
        assert_eq!(details.gps_label().as_deref(), Some("48.856667, 2.352222"));
        assert_eq!(details.capture_time.as_deref(), Some("2024:01:15 14:30:00"));
        assert!(details.content_hash_hex.is_none());
    }

    #[test]
    fn southern_and_western_hemispheres_are_negative() {
        let tags = vec![
            (tags::GPS_LATITUDE, TagValue::Rationals(vec![33.0, 52.0, 4.0])),
            (tags::GPS_LATITUDE_REF, TagValue::Text("S".into())),
            (tags::GPS_LONGITUDE, TagValue::Rationals(vec![151.0, 12.0, 36.0])),
            (tags::GPS_LONGITUDE_REF, TagValue::Text("W".into())),
        ];
        let (lat, lon) = extractor(&tags)
            .extract_from(FileKind::Png, b"png", false)
            .gps
            .unwrap();
        assert!(lat < 0.0);
        assert!(lon < 0.0);
    }

    #[test]
    fn capture_time_falls_back_to_date_time() {
        let tags = vec![(tags::DATE_TIME, TagValue::Text("2022:06:01 08:00:00".into()))];
        let details = extractor(&tags).extract_from(FileKind::Jpeg, b"x", false);
        assert_eq!(details.capture_time.as_deref(), Some("2022:06:01 08:00:00"));
    }

    #[test]
    fn gps_needs_both_axes() {
        let tags = vec![(tags::GPS_LATITUDE, TagValue::Rationals(vec![48.0, 51.0, 24.0]))];
        let details = extractor(&tags).extract_from(FileKind::Jpg, b"x", false);
        assert!(details.gps.is_none());
    }

    #[test]
    fn short_rational_triples_are_ignored() {
        let tags = vec![
            (tags::GPS_LATITUDE, TagValue::Rationals(vec![48.0, 51.0])),
            (tags::GPS_LONGITUDE, TagValue::Rationals(vec![2.0, 21.0, 8.0])),
        ];
        let details = extractor(&tags).extract_from(FileKind::Jpg, b"x", false);
        assert!(details.gps.is_none());
    }

    #[test]
    fn gif_and_webp_skip_exif_but_still_hash() {
        let ex = extractor(&paris());
        for kind in [FileKind::Gif, FileKind::Webp] {
            let details = ex.extract_from(kind, b"hello", true);
            assert!(details.gps.is_none());
            assert!(details.capture_time.is_none());
            assert_eq!(
                details.content_hash_hex.as_deref(),
                Some("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
            );
        }
    }

    #[test]
    fn exif_reader_tolerates_garbage() {
        assert!(ExifTagReader.read_tags(b"not an image").is_empty());
    }

    #[test]
    fn real_png_without_exif_yields_empty_details() {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let details = MetadataExtractor::default().extract_from(FileKind::Png, &png, false);
        assert_eq!(details, ImageDetails::default());
    }
}
