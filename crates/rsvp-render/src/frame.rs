//! Per-group frame composition.
//!
//! Every frame places the group's ORP character at the exact horizontal
//! center of the canvas, so the viewer's eye never moves between frames.

use std::path::Path;

use image::{Rgb as ImageRgb, RgbImage};
use rsvp_models::{Rgb, VideoConfig};

use crate::error::RenderResult;
use crate::font::{CharMetrics, FontFace, FontLibrary};
use crate::orp::recognition_index;

/// Height of the fixation tick mark in pixels.
const TICK_HEIGHT: u32 = 10;
/// Width of the fixation tick mark in pixels.
const TICK_WIDTH: u32 = 3;
/// Gap between the tick mark and the top of the text box.
const TICK_GAP: i64 = 20;

/// Renders one image per word group.
pub struct FrameCompositor {
    width: u32,
    height: u32,
    text_color: Rgb,
    bg_color: Rgb,
    highlight_color: Rgb,
    face: FontFace,
    font_size: f32,
}

impl FrameCompositor {
    /// Build a compositor for a clamped [`VideoConfig`], loading the
    /// configured font from the injected library.
    pub fn new(config: &VideoConfig, fonts: &FontLibrary) -> Self {
        let font_size = (config.width.min(config.height) / 8) as f32;
        Self {
            width: config.width,
            height: config.height,
            text_color: config.text_color,
            bg_color: config.bg_color,
            highlight_color: config.highlight_color,
            face: fonts.load(config.font),
            font_size,
        }
    }

    /// Render a group's display text and write it as a PNG.
    pub fn compose(&self, text: &str, path: &Path) -> RenderResult<()> {
        let img = self.render(text);
        img.save(path)?;
        Ok(())
    }

    /// Render a group's display text to an image buffer.
    pub fn render(&self, text: &str) -> RgbImage {
        let mut img = RgbImage::from_pixel(
            self.width,
            self.height,
            ImageRgb([self.bg_color.r, self.bg_color.g, self.bg_color.b]),
        );

        let chars: Vec<char> = text.chars().collect();
        let metrics: Vec<CharMetrics> = chars
            .iter()
            .map(|&ch| self.face.metrics(ch, self.font_size))
            .collect();

        // Visual center of each character as if the string started at x=0.
        let mut centers = Vec::with_capacity(chars.len());
        let mut pen = 0.0f32;
        for m in &metrics {
            centers.push(pen + m.center());
            pen += m.advance;
        }

        // ORP index is measured on the despaced text but applied to the
        // spaced display string, matching the per-character layout above.
        let orp = recognition_index(text);
        let orp_center = centers.get(orp).copied().unwrap_or(0.0);

        // Translate the whole string so the ORP center lands on the
        // horizontal midpoint of the canvas.
        let screen_center_x = (self.width / 2) as f32;
        let start_x = screen_center_x - orp_center;

        // Vertically center the string's inked bounding box.
        let max_top = metrics.iter().map(|m| m.top).fold(0.0f32, f32::max);
        let min_bottom = metrics.iter().map(|m| m.bottom).fold(0.0f32, f32::min);
        let text_height = max_top - min_bottom;
        let box_top = (self.height as f32 - text_height) / 2.0;
        let baseline = box_top + max_top;

        let mut pen = start_x;
        for (i, &ch) in chars.iter().enumerate() {
            let glyph = self.face.rasterize(ch, self.font_size);
            let color = if i == orp {
                self.highlight_color
            } else {
                self.text_color
            };
            let x0 = (pen + glyph.metrics.left).round() as i64;
            let y0 = (baseline - glyph.metrics.top).round() as i64;
            self.blend_glyph(&mut img, x0, y0, &glyph.coverage, glyph.width, glyph.height, color);
            pen += glyph.metrics.advance;
        }

        self.draw_tick(&mut img, box_top.round() as i64);

        img
    }

    /// Alpha-blend a coverage bitmap over the background.
    fn blend_glyph(
        &self,
        img: &mut RgbImage,
        x0: i64,
        y0: i64,
        coverage: &[u8],
        glyph_width: usize,
        glyph_height: usize,
        color: Rgb,
    ) {
        for gy in 0..glyph_height {
            let y = y0 + gy as i64;
            if y < 0 || y >= self.height as i64 {
                continue;
            }
            for gx in 0..glyph_width {
                let x = x0 + gx as i64;
                if x < 0 || x >= self.width as i64 {
                    continue;
                }
                let alpha = coverage[gy * glyph_width + gx] as u32;
                if alpha == 0 {
                    continue;
                }
                let px = img.get_pixel_mut(x as u32, y as u32);
                px.0 = [
                    blend_channel(px.0[0], color.r, alpha),
                    blend_channel(px.0[1], color.g, alpha),
                    blend_channel(px.0[2], color.b, alpha),
                ];
            }
        }
    }

    /// Short vertical tick above the text box at the horizontal midpoint,
    /// a fixed visual reference independent of word length.
    fn draw_tick(&self, img: &mut RgbImage, box_top: i64) {
        let color = ImageRgb([
            self.highlight_color.r,
            self.highlight_color.g,
            self.highlight_color.b,
        ]);
        let center_x = (self.width / 2) as i64;
        let tick_top = box_top - TICK_GAP;

        for dy in 0..TICK_HEIGHT as i64 {
            let y = tick_top + dy;
            if y < 0 || y >= self.height as i64 {
                continue;
            }
            for dx in 0..TICK_WIDTH as i64 {
                let x = center_x - (TICK_WIDTH as i64 / 2) + dx;
                if x < 0 || x >= self.width as i64 {
                    continue;
                }
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

fn blend_channel(under: u8, over: u8, alpha: u32) -> u8 {
    let inv = 255 - alpha;
    ((under as u32 * inv + over as u32 * alpha) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsvp_models::FontChoice;

    fn compositor(width: u32, height: u32) -> FrameCompositor {
        let config = VideoConfig {
            width,
            height,
            font: FontChoice::Default,
            ..VideoConfig::default()
        }
        .clamped();
        // Empty library forces the builtin face for deterministic cells.
        FrameCompositor::new(&config, &FontLibrary::empty())
    }

    fn highlight_centroid_x(img: &RgbImage) -> f64 {
        let mut sum = 0u64;
        let mut count = 0u64;
        for (x, _, px) in img.enumerate_pixels() {
            if px.0 == [255, 0, 0] {
                sum += x as u64;
                count += 1;
            }
        }
        assert!(count > 0, "no highlight pixels rendered");
        sum as f64 / count as f64
    }

    #[test]
    fn test_render_dimensions() {
        let img = compositor(640, 360).render("word");
        assert_eq!(img.dimensions(), (640, 360));
    }

    #[test]
    fn test_background_fill() {
        let img = compositor(320, 180).render("x");
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(319, 179).0, [255, 255, 255]);
    }

    #[test]
    fn test_orp_character_straddles_screen_center() {
        // "iii" fixates on the middle character; with the builtin face the
        // highlighted cell (and the tick) are symmetric about width/2.
        let img = compositor(640, 360).render("iii");
        let centroid = highlight_centroid_x(&img);
        assert!(
            (centroid - 320.0).abs() <= 6.0,
            "highlight centroid {centroid} too far from center"
        );
    }

    #[test]
    fn test_tick_mark_above_text() {
        let img = compositor(640, 360).render("fixate");
        // Scan the center column above the vertical midpoint for the tick.
        let found = (0..180).any(|y| img.get_pixel(320, y).0 == [255, 0, 0]);
        assert!(found, "no tick mark found above the text box");
    }

    #[test]
    fn test_compose_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame_000000.png");
        compositor(320, 180).compose("hello", &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (320, 180));
    }

    #[test]
    fn test_single_char_is_highlighted_at_center() {
        let img = compositor(640, 360).render("a");
        let centroid = highlight_centroid_x(&img);
        assert!((centroid - 320.0).abs() <= 6.0);
    }
}
