//! Font selection and glyph rasterization.
//!
//! The library maps each [`FontChoice`] to candidate font files on disk and
//! is injected into the compositor at construction; nothing reads ambient
//! font state. When no candidate loads, rendering falls back to an embedded
//! 5x7 bitmap face so a missing font never fails a job.

use std::collections::HashMap;
use std::path::PathBuf;

use fontdue::{Font, FontSettings};
use rsvp_models::FontChoice;
use tracing::{debug, warn};

/// Horizontal and vertical extents of one character, measured as if drawn
/// with the pen at x=0 on the baseline. Vertical values are y-up.
#[derive(Debug, Clone, Copy)]
pub struct CharMetrics {
    /// Pen advance to the next character
    pub advance: f32,
    /// Left bearing of the inked box
    pub left: f32,
    /// Inked width
    pub width: f32,
    /// Inked extent above the baseline
    pub top: f32,
    /// Inked extent at the bottom (negative below the baseline)
    pub bottom: f32,
}

impl CharMetrics {
    /// Horizontal visual center of the inked box relative to the pen.
    pub fn center(&self) -> f32 {
        self.left + self.width / 2.0
    }
}

/// A rasterized character: coverage rows top-down, one byte per pixel.
#[derive(Debug, Clone)]
pub struct RasterGlyph {
    pub metrics: CharMetrics,
    pub width: usize,
    pub height: usize,
    pub coverage: Vec<u8>,
}

/// A loaded font face: a parsed TrueType font or the embedded fallback.
pub enum FontFace {
    TrueType(Font),
    Builtin,
}

impl FontFace {
    pub fn is_builtin(&self) -> bool {
        matches!(self, FontFace::Builtin)
    }

    /// Measure one character at the given pixel size.
    pub fn metrics(&self, ch: char, px: f32) -> CharMetrics {
        match self {
            FontFace::TrueType(font) => {
                let m = font.metrics(ch, px);
                CharMetrics {
                    advance: m.advance_width,
                    left: m.xmin as f32,
                    width: m.width as f32,
                    top: (m.ymin + m.height as i32) as f32,
                    bottom: m.ymin as f32,
                }
            }
            FontFace::Builtin => builtin::metrics(px),
        }
    }

    /// Rasterize one character at the given pixel size.
    pub fn rasterize(&self, ch: char, px: f32) -> RasterGlyph {
        match self {
            FontFace::TrueType(font) => {
                let (m, coverage) = font.rasterize(ch, px);
                RasterGlyph {
                    metrics: CharMetrics {
                        advance: m.advance_width,
                        left: m.xmin as f32,
                        width: m.width as f32,
                        top: (m.ymin + m.height as i32) as f32,
                        bottom: m.ymin as f32,
                    },
                    width: m.width,
                    height: m.height,
                    coverage,
                }
            }
            FontFace::Builtin => builtin::rasterize(ch, px),
        }
    }
}

/// Explicit mapping from font selector to candidate font files.
#[derive(Debug, Clone)]
pub struct FontLibrary {
    candidates: HashMap<FontChoice, Vec<PathBuf>>,
}

impl FontLibrary {
    /// An empty library; every load falls back to the builtin face.
    pub fn empty() -> Self {
        Self {
            candidates: HashMap::new(),
        }
    }

    /// The DejaVu family shipped by the deployment image.
    pub fn with_system_defaults() -> Self {
        let dejavu = PathBuf::from("/usr/share/fonts/truetype/dejavu");
        let mut candidates = HashMap::new();
        candidates.insert(
            FontChoice::Default,
            vec![dejavu.join("DejaVuSans.ttf")],
        );
        candidates.insert(
            FontChoice::Serif,
            vec![dejavu.join("DejaVuSerif.ttf")],
        );
        candidates.insert(
            FontChoice::Monospace,
            vec![dejavu.join("DejaVuSansMono.ttf")],
        );
        Self { candidates }
    }

    /// Replace the candidate files for a selector.
    pub fn set_candidates(&mut self, choice: FontChoice, paths: Vec<PathBuf>) {
        self.candidates.insert(choice, paths);
    }

    /// Load a face for the selector.
    ///
    /// Tries the selector's candidates first, then every other selector's,
    /// and finally the builtin face. Never fails.
    pub fn load(&self, choice: FontChoice) -> FontFace {
        let preferred = self.candidates.get(&choice).into_iter().flatten();
        let others = self
            .candidates
            .iter()
            .filter(|(c, _)| **c != choice)
            .flat_map(|(_, paths)| paths);

        for path in preferred.chain(others) {
            match std::fs::read(path) {
                Ok(bytes) => match Font::from_bytes(bytes, FontSettings::default()) {
                    Ok(font) => {
                        debug!("Loaded font {} for {}", path.display(), choice);
                        return FontFace::TrueType(font);
                    }
                    Err(e) => warn!("Failed to parse font {}: {}", path.display(), e),
                },
                Err(e) => debug!("Font {} unavailable: {}", path.display(), e),
            }
        }

        warn!("No font file available for {}, using builtin face", choice);
        FontFace::Builtin
    }
}

/// Embedded 5x7 bitmap face, scaled to the requested pixel size.
mod builtin {
    use super::{CharMetrics, RasterGlyph};

    /// Columns per glyph cell, plus one column of spacing in the advance.
    const COLS: usize = 5;
    const ROWS: usize = 7;

    fn scale_for(px: f32) -> usize {
        ((px / 8.0).round() as usize).max(1)
    }

    pub(super) fn metrics(px: f32) -> CharMetrics {
        let s = scale_for(px) as f32;
        CharMetrics {
            advance: (COLS as f32 + 1.0) * s,
            left: 0.0,
            width: COLS as f32 * s,
            top: ROWS as f32 * s,
            bottom: 0.0,
        }
    }

    pub(super) fn rasterize(ch: char, px: f32) -> RasterGlyph {
        let s = scale_for(px);
        let (width, height) = (COLS * s, ROWS * s);
        let columns = glyph_columns(ch);

        let mut coverage = vec![0u8; width * height];
        for (col, bits) in columns.iter().enumerate() {
            for row in 0..ROWS {
                if bits & (1 << row) != 0 {
                    for dy in 0..s {
                        let y = row * s + dy;
                        let x0 = col * s;
                        coverage[y * width + x0..y * width + x0 + s].fill(255);
                    }
                }
            }
        }

        RasterGlyph {
            metrics: metrics(px),
            width,
            height,
            coverage,
        }
    }

    fn glyph_columns(ch: char) -> [u8; COLS] {
        let index = ch as usize;
        if (0x20..=0x7E).contains(&index) {
            GLYPHS[index - 0x20]
        } else {
            // Unknown characters render as a filled box.
            [0x7F, 0x41, 0x41, 0x41, 0x7F]
        }
    }

    /// ASCII 0x20-0x7E, column-major, bit 0 = top row.
    const GLYPHS: [[u8; COLS]; 95] = [
        [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
        [0x00, 0x00, 0x5F, 0x00, 0x00], // '!'
        [0x00, 0x07, 0x00, 0x07, 0x00], // '"'
        [0x14, 0x7F, 0x14, 0x7F, 0x14], // '#'
        [0x24, 0x2A, 0x7F, 0x2A, 0x12], // '$'
        [0x23, 0x13, 0x08, 0x64, 0x62], // '%'
        [0x36, 0x49, 0x55, 0x22, 0x50], // '&'
        [0x00, 0x05, 0x03, 0x00, 0x00], // '\''
        [0x00, 0x1C, 0x22, 0x41, 0x00], // '('
        [0x00, 0x41, 0x22, 0x1C, 0x00], // ')'
        [0x14, 0x08, 0x3E, 0x08, 0x14], // '*'
        [0x08, 0x08, 0x3E, 0x08, 0x08], // '+'
        [0x00, 0x50, 0x30, 0x00, 0x00], // ','
        [0x08, 0x08, 0x08, 0x08, 0x08], // '-'
        [0x00, 0x60, 0x60, 0x00, 0x00], // '.'
        [0x20, 0x10, 0x08, 0x04, 0x02], // '/'
        [0x3E, 0x51, 0x49, 0x45, 0x3E], // '0'
        [0x00, 0x42, 0x7F, 0x40, 0x00], // '1'
        [0x42, 0x61, 0x51, 0x49, 0x46], // '2'
        [0x21, 0x41, 0x45, 0x4B, 0x31], // '3'
        [0x18, 0x14, 0x12, 0x7F, 0x10], // '4'
        [0x27, 0x45, 0x45, 0x45, 0x39], // '5'
        [0x3C, 0x4A, 0x49, 0x49, 0x30], // '6'
        [0x01, 0x71, 0x09, 0x05, 0x03], // '7'
        [0x36, 0x49, 0x49, 0x49, 0x36], // '8'
        [0x06, 0x49, 0x49, 0x29, 0x1E], // '9'
        [0x00, 0x36, 0x36, 0x00, 0x00], // ':'
        [0x00, 0x56, 0x36, 0x00, 0x00], // ';'
        [0x08, 0x14, 0x22, 0x41, 0x00], // '<'
        [0x14, 0x14, 0x14, 0x14, 0x14], // '='
        [0x00, 0x41, 0x22, 0x14, 0x08], // '>'
        [0x02, 0x01, 0x51, 0x09, 0x06], // '?'
        [0x32, 0x49, 0x79, 0x41, 0x3E], // '@'
        [0x7E, 0x11, 0x11, 0x11, 0x7E], // 'A'
        [0x7F, 0x49, 0x49, 0x49, 0x36], // 'B'
        [0x3E, 0x41, 0x41, 0x41, 0x22], // 'C'
        [0x7F, 0x41, 0x41, 0x22, 0x1C], // 'D'
        [0x7F, 0x49, 0x49, 0x49, 0x41], // 'E'
        [0x7F, 0x09, 0x09, 0x09, 0x01], // 'F'
        [0x3E, 0x41, 0x49, 0x49, 0x7A], // 'G'
        [0x7F, 0x08, 0x08, 0x08, 0x7F], // 'H'
        [0x00, 0x41, 0x7F, 0x41, 0x00], // 'I'
        [0x20, 0x40, 0x41, 0x3F, 0x01], // 'J'
        [0x7F, 0x08, 0x14, 0x22, 0x41], // 'K'
        [0x7F, 0x40, 0x40, 0x40, 0x40], // 'L'
        [0x7F, 0x02, 0x0C, 0x02, 0x7F], // 'M'
        [0x7F, 0x04, 0x08, 0x10, 0x7F], // 'N'
        [0x3E, 0x41, 0x41, 0x41, 0x3E], // 'O'
        [0x7F, 0x09, 0x09, 0x09, 0x06], // 'P'
        [0x3E, 0x41, 0x51, 0x21, 0x5E], // 'Q'
        [0x7F, 0x09, 0x19, 0x29, 0x46], // 'R'
        [0x46, 0x49, 0x49, 0x49, 0x31], // 'S'
        [0x01, 0x01, 0x7F, 0x01, 0x01], // 'T'
        [0x3F, 0x40, 0x40, 0x40, 0x3F], // 'U'
        [0x1F, 0x20, 0x40, 0x20, 0x1F], // 'V'
        [0x3F, 0x40, 0x38, 0x40, 0x3F], // 'W'
        [0x63, 0x14, 0x08, 0x14, 0x63], // 'X'
        [0x07, 0x08, 0x70, 0x08, 0x07], // 'Y'
        [0x61, 0x51, 0x49, 0x45, 0x43], // 'Z'
        [0x00, 0x7F, 0x41, 0x41, 0x00], // '['
        [0x02, 0x04, 0x08, 0x10, 0x20], // '\\'
        [0x00, 0x41, 0x41, 0x7F, 0x00], // ']'
        [0x04, 0x02, 0x01, 0x02, 0x04], // '^'
        [0x40, 0x40, 0x40, 0x40, 0x40], // '_'
        [0x00, 0x01, 0x02, 0x04, 0x00], // '`'
        [0x20, 0x54, 0x54, 0x54, 0x78], // 'a'
        [0x7F, 0x48, 0x44, 0x44, 0x38], // 'b'
        [0x38, 0x44, 0x44, 0x44, 0x20], // 'c'
        [0x38, 0x44, 0x44, 0x48, 0x7F], // 'd'
        [0x38, 0x54, 0x54, 0x54, 0x18], // 'e'
        [0x08, 0x7E, 0x09, 0x01, 0x02], // 'f'
        [0x0C, 0x52, 0x52, 0x52, 0x3E], // 'g'
        [0x7F, 0x08, 0x04, 0x04, 0x78], // 'h'
        [0x00, 0x44, 0x7D, 0x40, 0x00], // 'i'
        [0x20, 0x40, 0x44, 0x3D, 0x00], // 'j'
        [0x7F, 0x10, 0x28, 0x44, 0x00], // 'k'
        [0x00, 0x41, 0x7F, 0x40, 0x00], // 'l'
        [0x7C, 0x04, 0x18, 0x04, 0x78], // 'm'
        [0x7C, 0x08, 0x04, 0x04, 0x78], // 'n'
        [0x38, 0x44, 0x44, 0x44, 0x38], // 'o'
        [0x7C, 0x14, 0x14, 0x14, 0x08], // 'p'
        [0x08, 0x14, 0x14, 0x18, 0x7C], // 'q'
        [0x7C, 0x08, 0x04, 0x04, 0x08], // 'r'
        [0x48, 0x54, 0x54, 0x54, 0x20], // 's'
        [0x04, 0x3F, 0x44, 0x40, 0x20], // 't'
        [0x3C, 0x40, 0x40, 0x20, 0x7C], // 'u'
        [0x1C, 0x20, 0x40, 0x20, 0x1C], // 'v'
        [0x3C, 0x40, 0x30, 0x40, 0x3C], // 'w'
        [0x44, 0x28, 0x10, 0x28, 0x44], // 'x'
        [0x0C, 0x50, 0x50, 0x50, 0x3C], // 'y'
        [0x44, 0x64, 0x54, 0x4C, 0x44], // 'z'
        [0x00, 0x08, 0x36, 0x41, 0x00], // '{'
        [0x00, 0x00, 0x7F, 0x00, 0x00], // '|'
        [0x00, 0x41, 0x36, 0x08, 0x00], // '}'
        [0x08, 0x04, 0x08, 0x10, 0x08], // '~'
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_library_falls_back_to_builtin() {
        let face = FontLibrary::empty().load(FontChoice::Default);
        assert!(face.is_builtin());
    }

    #[test]
    fn test_missing_candidates_fall_back_to_builtin() {
        let mut library = FontLibrary::empty();
        library.set_candidates(
            FontChoice::Serif,
            vec![PathBuf::from("/nonexistent/serif.ttf")],
        );
        assert!(library.load(FontChoice::Serif).is_builtin());
    }

    #[test]
    fn test_builtin_metrics_scale_with_size() {
        let face = FontFace::Builtin;
        let small = face.metrics('H', 8.0);
        let large = face.metrics('H', 135.0);
        assert!(large.advance > small.advance);
        assert!(large.top > small.top);
        assert_eq!(small.bottom, 0.0);
    }

    #[test]
    fn test_builtin_rasterizes_ink_for_visible_chars() {
        let glyph = FontFace::Builtin.rasterize('H', 64.0);
        assert_eq!(glyph.coverage.len(), glyph.width * glyph.height);
        assert!(glyph.coverage.iter().any(|&c| c == 255));

        let space = FontFace::Builtin.rasterize(' ', 64.0);
        assert!(space.coverage.iter().all(|&c| c == 0));
    }
}
