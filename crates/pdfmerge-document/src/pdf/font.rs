// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fonts for output pages.
//
// Text is written with WinAnsiEncoding single-byte strings, so every font
// carries a width table for codes 32..=255. Standard fonts use the AFM
// widths of Helvetica/Helvetica-Bold and need no embedded program; TrueType
// fonts are parsed with `ttf-parser` and embedded whole as `/FontFile2`.

use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use pdfmerge_core::StandardFont;
use pdfmerge_core::error::{PdfMergeError, Result};
use tracing::debug;

/// First character code described by the width table.
pub const FIRST_CHAR: u8 = 32;
/// Last character code described by the width table.
pub const LAST_CHAR: u8 = 255;

/// Byte written for characters WinAnsi cannot represent.
const REPLACEMENT: u8 = b'?';

/// Helvetica advance widths for codes 32..=126, in 1/1000 em.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 32-47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :;<=>?@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [\]^_`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {|}~
];

/// Helvetica-Bold advance widths for codes 32..=126, in 1/1000 em.
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 32-47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    333, 333, 584, 584, 584, 611, 975, // :;<=>?@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    333, 278, 333, 584, 556, 333, // [\]^_`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a-m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n-z
    389, 280, 389, 584, // {|}~
];

/// Width assumed for standard-font codes above 126.
const STANDARD_UPPER_WIDTH: u16 = 556;

/// WinAnsi codes 0x80..=0x9F that differ from Latin-1.
const WIN_ANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

/// Map a character to its WinAnsi byte, if it has one.
pub fn win_ansi_code(ch: char) -> Option<u8> {
    match ch as u32 {
        0x20..=0x7E | 0xA0..=0xFF => Some(ch as u32 as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|(_, c)| *c == ch)
            .map(|(code, _)| *code),
    }
}

/// Character represented by a WinAnsi byte, if any.
fn win_ansi_char(code: u8) -> Option<char> {
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(char::from(code)),
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, ch)| *ch),
    }
}

/// Font descriptor values for an embedded TrueType program.
#[derive(Debug, Clone)]
struct Descriptor {
    ascent: i64,
    descent: i64,
    cap_height: i64,
    bbox: [i64; 4],
}

#[derive(Debug, Clone)]
enum FontProgram {
    Standard,
    TrueType {
        data: Vec<u8>,
        descriptor: Descriptor,
    },
}

/// A font ready to be measured and embedded.
#[derive(Debug, Clone)]
pub struct LoadedFont {
    base_font: String,
    /// Advance widths for codes `FIRST_CHAR..=LAST_CHAR`, in 1/1000 em.
    widths: Vec<u16>,
    program: FontProgram,
}

impl LoadedFont {
    /// One of the PDF standard fonts.
    pub fn standard(font: StandardFont) -> Self {
        let ascii = match font {
            StandardFont::Helvetica => &HELVETICA_ASCII,
            StandardFont::HelveticaBold => &HELVETICA_BOLD_ASCII,
        };
        let widths = (FIRST_CHAR..=LAST_CHAR)
            .map(|code| match code {
                32..=126 => ascii[usize::from(code - FIRST_CHAR)],
                0xA0 => ascii[0],
                _ => STANDARD_UPPER_WIDTH,
            })
            .collect();
        Self {
            base_font: font.base_font().to_string(),
            widths,
            program: FontProgram::Standard,
        }
    }

    /// Parse a TrueType font program.
    pub fn from_truetype(data: Vec<u8>) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|err| PdfMergeError::FontError(format!("cannot parse TrueType font: {err}")))?;

        let units_per_em = f64::from(face.units_per_em().max(1));
        let to_milli = |units: f64| (units * 1000.0 / units_per_em).round();

        let missing = face
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .map(|adv| to_milli(f64::from(adv)) as u16)
            .unwrap_or(0);
        let widths = (FIRST_CHAR..=LAST_CHAR)
            .map(|code| {
                win_ansi_char(code)
                    .and_then(|ch| face.glyph_index(ch))
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .map(|adv| to_milli(f64::from(adv)) as u16)
                    .unwrap_or(missing)
            })
            .collect();

        let bbox = face.global_bounding_box();
        let descriptor = Descriptor {
            ascent: to_milli(f64::from(face.ascender())) as i64,
            descent: to_milli(f64::from(face.descender())) as i64,
            cap_height: to_milli(f64::from(face.capital_height().unwrap_or(face.ascender()))) as i64,
            bbox: [
                to_milli(f64::from(bbox.x_min)) as i64,
                to_milli(f64::from(bbox.y_min)) as i64,
                to_milli(f64::from(bbox.x_max)) as i64,
                to_milli(f64::from(bbox.y_max)) as i64,
            ],
        };

        let base_font = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .find_map(|name| name.to_string())
            .map(|name| sanitize_font_name(&name))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "EmbeddedFont".to_string());

        debug!(font = %base_font, bytes_len = data.len(), "TrueType font parsed");

        Ok(Self {
            base_font,
            widths,
            program: FontProgram::TrueType { data, descriptor },
        })
    }

    /// PostScript name written as `/BaseFont`.
    pub fn base_font(&self) -> &str {
        &self.base_font
    }

    /// Whether the font program is embedded in the output.
    pub fn is_embedded(&self) -> bool {
        matches!(self.program, FontProgram::TrueType { .. })
    }

    /// Encode text as WinAnsi bytes, replacing unmappable characters with `?`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        text.chars()
            .map(|ch| win_ansi_code(ch).unwrap_or(REPLACEMENT))
            .collect()
    }

    /// Rendered width of `text` at `size` points.
    pub fn width_of_text_at_size(&self, text: &str, size: f64) -> f64 {
        let units: u32 = self
            .encode(text)
            .into_iter()
            .map(|code| u32::from(self.code_width(code)))
            .sum();
        f64::from(units) * size / 1000.0
    }

    fn code_width(&self, code: u8) -> u16 {
        if code < FIRST_CHAR {
            return 0;
        }
        self.widths[usize::from(code - FIRST_CHAR)]
    }

    /// Write the font dictionary (and, for TrueType, its descriptor and
    /// program) into `doc`, returning the font dictionary's id.
    pub(crate) fn write_objects(&self, doc: &mut Document) -> ObjectId {
        match &self.program {
            FontProgram::Standard => doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => Object::Name(self.base_font.as_bytes().to_vec()),
                "Encoding" => "WinAnsiEncoding",
            }),
            FontProgram::TrueType { data, descriptor } => {
                let program = Stream::new(
                    dictionary! { "Length1" => data.len() as i64 },
                    data.clone(),
                );
                let program_id = doc.add_object(program);
                let descriptor_id = doc.add_object(dictionary! {
                    "Type" => "FontDescriptor",
                    "FontName" => Object::Name(self.base_font.as_bytes().to_vec()),
                    // Nonsymbolic.
                    "Flags" => 32,
                    "FontBBox" => descriptor.bbox.iter().map(|v| Object::Integer(*v)).collect::<Vec<Object>>(),
                    "ItalicAngle" => 0,
                    "Ascent" => descriptor.ascent,
                    "Descent" => descriptor.descent,
                    "CapHeight" => descriptor.cap_height,
                    "StemV" => 80,
                    "FontFile2" => program_id,
                });
                let widths: Vec<Object> = self
                    .widths
                    .iter()
                    .map(|w| Object::Integer(i64::from(*w)))
                    .collect();
                doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "TrueType",
                    "BaseFont" => Object::Name(self.base_font.as_bytes().to_vec()),
                    "FirstChar" => i64::from(FIRST_CHAR),
                    "LastChar" => i64::from(LAST_CHAR),
                    "Widths" => widths,
                    "FontDescriptor" => descriptor_id,
                    "Encoding" => "WinAnsiEncoding",
                })
            }
        }
    }
}

/// PostScript names may not contain spaces or delimiters.
fn sanitize_font_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_measures_known_strings() {
        let font = LoadedFont::standard(StandardFont::Helvetica);
        // "Image 1": I=278 m=833 a=556 g=556 e=556 space=278 1=556 → 3613
        let width = font.width_of_text_at_size("Image 1", 10.0);
        assert!((width - 36.13).abs() < 1e-9);
    }

    #[test]
    fn bold_is_wider_than_regular() {
        let regular = LoadedFont::standard(StandardFont::Helvetica);
        let bold = LoadedFont::standard(StandardFont::HelveticaBold);
        let text = "holiday-photo.jpg";
        assert!(bold.width_of_text_at_size(text, 10.0) > regular.width_of_text_at_size(text, 10.0));
    }

    #[test]
    fn width_scales_linearly_with_size() {
        let font = LoadedFont::standard(StandardFont::HelveticaBold);
        let at_10 = font.width_of_text_at_size("PDFMerge", 10.0);
        let at_20 = font.width_of_text_at_size("PDFMerge", 20.0);
        assert!((at_20 - 2.0 * at_10).abs() < 1e-9);
    }

    #[test]
    fn encoding_maps_win_ansi_and_replaces_the_rest() {
        let font = LoadedFont::standard(StandardFont::Helvetica);
        assert_eq!(font.encode("Café €"), vec![b'C', b'a', b'f', 0xE9, b' ', 0x80]);
        assert_eq!(font.encode("日本"), vec![b'?', b'?']);
    }

    #[test]
    fn garbage_is_not_a_truetype_font() {
        let err = LoadedFont::from_truetype(b"definitely not a font".to_vec()).unwrap_err();
        assert!(matches!(err, PdfMergeError::FontError(_)));
    }

    #[test]
    fn standard_font_is_not_embedded() {
        let font = LoadedFont::standard(StandardFont::Helvetica);
        assert!(!font.is_embedded());
        let mut doc = Document::with_version("1.7");
        let id = font.write_objects(&mut doc);
        let dict = doc.get_dictionary(id).unwrap();
        assert_eq!(dict.get(b"BaseFont").unwrap().as_name().unwrap(), b"Helvetica");
    }
}
