// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Presentation helpers: human file sizes and EXIF capture-time rendering.

use chrono::NaiveDateTime;

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// EXIF date layout, e.g. `2024:01:15 14:30:00`.
const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Render a byte count in the largest fitting 1024-based unit, rounded to an
/// integer (`0 Byte`, `512 Bytes`, `2 MB`).
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Byte".to_string();
    }
    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(SIZE_UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    format!("{} {}", value.round(), SIZE_UNITS[exponent])
}

/// Render an EXIF capture time as `Jan 15, 2024, 02:30:00 PM`.
///
/// Returns an empty string for empty input and `Invalid Date` when the value
/// does not parse.
pub fn format_capture_time(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    match NaiveDateTime::parse_from_str(raw, EXIF_DATETIME_FORMAT) {
        Ok(parsed) => parsed.format("%b %-d, %Y, %I:%M:%S %p").to_string(),
        Err(_) => "Invalid Date".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(0), "0 Byte");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "2 KB");
        assert_eq!(format_file_size(50 * 1024 * 1024), "50 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }

    #[test]
    fn capture_time_formats_in_twelve_hour_clock() {
        assert_eq!(
            format_capture_time("2024:01:15 14:30:00"),
            "Jan 15, 2024, 02:30:00 PM"
        );
        assert_eq!(
            format_capture_time("2023:11:03 09:05:07"),
            "Nov 3, 2023, 09:05:07 AM"
        );
    }

    #[test]
    fn capture_time_edge_cases() {
        assert_eq!(format_capture_time(""), "");
        assert_eq!(format_capture_time("not a date"), "Invalid Date");
    }
}
