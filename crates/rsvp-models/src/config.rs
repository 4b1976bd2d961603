//! Video rendering configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ContentError;

/// Words-per-minute bounds enforced at job creation.
pub const MIN_WPM: u32 = 100;
pub const MAX_WPM: u32 = 5000;

/// Word grouping bounds enforced at job creation.
pub const MIN_GROUPING: u32 = 1;
pub const MAX_GROUPING: u32 = 3;

/// Font selector for frame rendering.
///
/// Each selector is bound to a font resource by the renderer's font
/// library; an unknown selector falls back to `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum FontChoice {
    #[default]
    Default,
    Serif,
    Monospace,
}

impl FontChoice {
    /// Parse a selector string leniently. Unknown values map to `Default`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "serif" => FontChoice::Serif,
            "monospace" | "mono" => FontChoice::Monospace,
            _ => FontChoice::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FontChoice::Default => "default",
            FontChoice::Serif => "serif",
            FontChoice::Monospace => "monospace",
        }
    }
}

impl fmt::Display for FontChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An RGB color triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#RRGGBB` (or `RRGGBB`) hex color.
    pub fn from_hex(hex: &str) -> Result<Self, ContentError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ContentError::InvalidColor(hex.to_string()));
        }
        let parse = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| ContentError::InvalidColor(hex.to_string()))
        };
        Ok(Self {
            r: parse(0..2)?,
            g: parse(2..4)?,
            b: parse(4..6)?,
        })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Configuration for a video generation job.
///
/// Bounded fields are clamped once, via [`VideoConfig::clamped`], when the
/// job is created; downstream components rely on the bounds holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoConfig {
    /// Reading pace in words per minute (clamped to [100, 5000])
    pub wpm: u32,
    /// Font selector
    #[serde(default)]
    pub font: FontChoice,
    /// Word/group text color
    pub text_color: Rgb,
    /// Frame background color
    pub bg_color: Rgb,
    /// ORP character and tick mark color
    pub highlight_color: Rgb,
    /// Extend display duration after punctuation
    pub pause_on_punctuation: bool,
    /// Words displayed per frame (clamped to [1, 3])
    pub word_grouping: u32,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            wpm: 300,
            font: FontChoice::Default,
            text_color: Rgb::new(0x00, 0x00, 0x00),
            bg_color: Rgb::new(0xFF, 0xFF, 0xFF),
            highlight_color: Rgb::new(0xFF, 0x00, 0x00),
            pause_on_punctuation: true,
            word_grouping: 1,
            width: 1920,
            height: 1080,
        }
    }
}

impl VideoConfig {
    /// Clamp bounded fields into their valid ranges.
    ///
    /// Zero frame dimensions are replaced with the 1920x1080 defaults so
    /// the renderer never sees a degenerate canvas.
    pub fn clamped(mut self) -> Self {
        self.wpm = self.wpm.clamp(MIN_WPM, MAX_WPM);
        self.word_grouping = self.word_grouping.clamp(MIN_GROUPING, MAX_GROUPING);
        if self.width == 0 {
            self.width = 1920;
        }
        if self.height == 0 {
            self.height = 1080;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamping_bounds() {
        let config = VideoConfig {
            wpm: 9999,
            word_grouping: 7,
            ..VideoConfig::default()
        }
        .clamped();

        assert_eq!(config.wpm, 5000);
        assert_eq!(config.word_grouping, 3);

        let config = VideoConfig {
            wpm: 1,
            word_grouping: 0,
            width: 0,
            height: 0,
            ..VideoConfig::default()
        }
        .clamped();

        assert_eq!(config.wpm, 100);
        assert_eq!(config.word_grouping, 1);
        assert_eq!(config.width, 1920);
        assert_eq!(config.height, 1080);
    }

    #[test]
    fn test_hex_color_parsing() {
        assert_eq!(Rgb::from_hex("#FF0000"), Ok(Rgb::new(255, 0, 0)));
        assert_eq!(Rgb::from_hex("00ff7f"), Ok(Rgb::new(0, 255, 127)));
        assert!(Rgb::from_hex("#F00").is_err());
        assert!(Rgb::from_hex("#GGGGGG").is_err());
        assert_eq!(Rgb::new(255, 0, 0).to_hex(), "#FF0000");
    }

    #[test]
    fn test_font_choice_lenient_parse() {
        assert_eq!(FontChoice::parse("serif"), FontChoice::Serif);
        assert_eq!(FontChoice::parse("MONO"), FontChoice::Monospace);
        assert_eq!(FontChoice::parse("arial"), FontChoice::Default);
        assert_eq!(FontChoice::parse(""), FontChoice::Default);
    }
}
