//! Badge typeface loading and measurement
//!
//! The badge font is loaded from disk exactly once per run and shared
//! read-only by every stamping call. Loading snapshots the face metrics
//! needed for the embedded font descriptor; string measurement shapes the
//! text with rustybuzz and sums the horizontal advances.

use std::fs;
use std::path::Path;

use rustybuzz::{Face, UnicodeBuffer};

use crate::error::{Error, Result};

/// A loaded badge typeface
///
/// Owns the raw TrueType data (later embedded into each output PDF) plus
/// the metrics extracted when the face was first parsed.
#[derive(Debug)]
pub struct BadgeFont {
    data: Vec<u8>,
    base_name: String,
    units_per_em: u16,
    ascent: i16,
    descent: i16,
    cap_height: i16,
    bbox: [i16; 4],
}

impl BadgeFont {
    /// Load and validate a TrueType font from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let data = fs::read(path)?;

        let (units_per_em, ascent, descent, cap_height, bbox) = {
            let face = Face::from_slice(&data, 0).ok_or_else(|| {
                Error::Font(format!("not a usable TrueType font: {}", path.display()))
            })?;

            let ascent = face.ascender();
            let rect = face.global_bounding_box();
            (
                face.units_per_em() as u16,
                ascent,
                face.descender(),
                face.capital_height().unwrap_or(ascent),
                [rect.x_min, rect.y_min, rect.x_max, rect.y_max],
            )
        };

        Ok(Self {
            data,
            base_name: base_name_from_path(path),
            units_per_em,
            ascent,
            descent,
            cap_height,
            bbox,
        })
    }

    /// The raw TrueType data, for embedding as a FontFile2 stream
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// PDF name for the BaseFont/FontName entries
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Measure the rendered width of `text` at `size`, in text-space units
    ///
    /// Shapes the string so kerning and ligatures are accounted for, then
    /// sums the horizontal advances.
    pub fn measure(&self, text: &str, size: f32) -> Result<f32> {
        let face = self.face()?;

        let mut buffer = UnicodeBuffer::new();
        buffer.push_str(text);
        let shaped = rustybuzz::shape(&face, &[], buffer);

        let advance: i32 = shaped.glyph_positions().iter().map(|p| p.x_advance).sum();
        Ok(advance as f32 * size / self.units_per_em as f32)
    }

    /// Advance widths for character codes 32-255 under WinAnsiEncoding
    ///
    /// Values are in 1/1000ths of the em square, as required by the
    /// embedded font's Widths array. Codes without a glyph fall back to
    /// the width of '?'.
    pub fn win_ansi_widths(&self) -> Result<Vec<i64>> {
        let face = self.face()?;

        let fallback = face
            .glyph_index('?')
            .and_then(|glyph| face.glyph_hor_advance(glyph))
            .unwrap_or(500);

        let widths = (32u8..=255)
            .map(|code| {
                let advance = win_ansi_to_char(code)
                    .and_then(|c| face.glyph_index(c))
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .unwrap_or(fallback);
                self.to_milliunits(advance as i32)
            })
            .collect();

        Ok(widths)
    }

    /// Font bounding box scaled to 1/1000 em
    pub fn scaled_bbox(&self) -> [i64; 4] {
        [
            self.to_milliunits(self.bbox[0] as i32),
            self.to_milliunits(self.bbox[1] as i32),
            self.to_milliunits(self.bbox[2] as i32),
            self.to_milliunits(self.bbox[3] as i32),
        ]
    }

    /// Typographic ascent scaled to 1/1000 em
    pub fn scaled_ascent(&self) -> i64 {
        self.to_milliunits(self.ascent as i32)
    }

    /// Typographic descent scaled to 1/1000 em (negative below baseline)
    pub fn scaled_descent(&self) -> i64 {
        self.to_milliunits(self.descent as i32)
    }

    /// Capital height scaled to 1/1000 em
    pub fn scaled_cap_height(&self) -> i64 {
        self.to_milliunits(self.cap_height as i32)
    }

    fn face(&self) -> Result<Face<'_>> {
        // The constructor already parsed this data once, so failure here
        // means the bytes were corrupted in memory.
        Face::from_slice(&self.data, 0)
            .ok_or_else(|| Error::Font("font data is no longer parseable".to_string()))
    }

    fn to_milliunits(&self, value: i32) -> i64 {
        (value as f32 * 1000.0 / self.units_per_em as f32).round() as i64
    }
}

/// Derive a PDF-safe font name from the file stem
///
/// The embedded FontFile2 stream carries the real tables, so the name only
/// needs to be a valid PDF name object.
fn base_name_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("BadgeFont");

    let cleaned: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();

    if cleaned.is_empty() {
        "BadgeFont".to_string()
    } else {
        cleaned
    }
}

/// Encode text as WinAnsi (Windows-1252) bytes for a PDF string operand
///
/// Characters outside the encoding are replaced with '?'.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    let code = c as u32;
    match code {
        0x20..=0x7E => code as u8,
        // Latin-1 range coincides with Unicode
        0xA0..=0xFF => code as u8,
        _ => WIN_ANSI_EXTRAS
            .iter()
            .find(|&&(_, ch)| ch == c)
            .map(|&(byte, _)| byte)
            .unwrap_or(b'?'),
    }
}

/// Unicode character for a WinAnsi code, if the code is defined
fn win_ansi_to_char(code: u8) -> Option<char> {
    match code {
        0x20..=0x7E => Some(code as char),
        0xA0..=0xFF => Some(code as char),
        _ => WIN_ANSI_EXTRAS
            .iter()
            .find(|&&(byte, _)| byte == code)
            .map(|&(_, ch)| ch),
    }
}

/// WinAnsi codes 0x80-0x9F that differ from Latin-1
/// (0x81, 0x8D, 0x8F, 0x90 and 0x9D are undefined)
const WIN_ANSI_EXTRAS: &[(u8, char)] = &[
    (0x80, '\u{20AC}'), // Euro
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
