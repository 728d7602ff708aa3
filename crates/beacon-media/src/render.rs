// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Still-card renderer backed by `image` and `fontdue`.

use std::path::Path;

use beacon_core::{BeaconError, CardContent, VisualRenderer};
use fontdue::{Font, FontSettings};
use image::{Rgb, RgbImage};
use tracing::warn;

const GRADIENT_FROM: [f32; 3] = [102.0, 126.0, 234.0]; // #667eea
const GRADIENT_TO: [f32; 3] = [118.0, 75.0, 162.0]; // #764ba2

const TITLE_PX: f32 = 80.0;
const TITLE_BASELINE: f32 = 180.0;
const BODY_PX: f32 = 64.0;
const BODY_BASELINE: f32 = 350.0;
const BODY_LINE_SPACING: f32 = 85.0;
const FOOTER_PX: f32 = 48.0;
const FOOTER_OFFSET_FROM_BOTTOM: f32 = 80.0;

/// Renders a gradient card with a centred title, message lines, and footer.
///
/// Without fonts the card is still produced, just without text.
pub struct FontCardRenderer {
    width: u32,
    height: u32,
    title_font: Option<Font>,
    body_font: Option<Font>,
    footer_font: Option<Font>,
}

impl FontCardRenderer {
    /// Creates a renderer without text support.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            title_font: None,
            body_font: None,
            footer_font: None,
        }
    }

    /// Loads fonts from disk. A font that cannot be read or parsed is logged
    /// and skipped; the body falls back to the title font and the footer to
    /// the body font.
    pub fn with_font_paths(
        width: u32,
        height: u32,
        title_font: Option<&Path>,
        body_font: Option<&Path>,
        footer_font: Option<&Path>,
    ) -> Self {
        let title = title_font.and_then(load_font);
        let body = body_font.and_then(load_font);
        let footer = footer_font.and_then(load_font);
        Self::with_fonts(width, height, title, body, footer)
    }

    /// Uses already parsed fonts.
    pub fn with_fonts(
        width: u32,
        height: u32,
        title: Option<Font>,
        body: Option<Font>,
        footer: Option<Font>,
    ) -> Self {
        let body = body.or_else(|| title.clone());
        let footer = footer.or_else(|| body.clone());
        Self {
            width,
            height,
            title_font: title,
            body_font: body,
            footer_font: footer,
        }
    }

    pub fn has_text(&self) -> bool {
        self.title_font.is_some() || self.body_font.is_some() || self.footer_font.is_some()
    }

    fn paint_background(&self, img: &mut RgbImage) {
        let span = (self.width + self.height).saturating_sub(2).max(1) as f32;
        for (x, y, px) in img.enumerate_pixels_mut() {
            let t = (x + y) as f32 / span;
            let channel = |i: usize| (GRADIENT_FROM[i] + (GRADIENT_TO[i] - GRADIENT_FROM[i]) * t).round() as u8;
            *px = Rgb([channel(0), channel(1), channel(2)]);
        }
    }

    fn draw_centered(&self, img: &mut RgbImage, font: &Font, text: &str, px: f32, baseline: f32) {
        let width: f32 = text.chars().map(|c| font.metrics(c, px).advance_width).sum();
        let mut pen_x = (self.width as f32 - width) / 2.0;

        for ch in text.chars() {
            let (metrics, coverage) = font.rasterize(ch, px);
            let left = pen_x.round() as i32 + metrics.xmin;
            let top = baseline.round() as i32 - metrics.height as i32 - metrics.ymin;

            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let alpha = coverage[row * metrics.width + col];
                    if alpha == 0 {
                        continue;
                    }
                    let (x, y) = (left + col as i32, top + row as i32);
                    if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
                        continue;
                    }
                    blend_white(img.get_pixel_mut(x as u32, y as u32), alpha);
                }
            }
            pen_x += metrics.advance_width;
        }
    }
}

impl VisualRenderer for FontCardRenderer {
    fn render(&self, card: &CardContent, output: &Path) -> Result<(), BeaconError> {
        let mut img = RgbImage::new(self.width, self.height);
        self.paint_background(&mut img);

        if let Some(font) = &self.title_font {
            self.draw_centered(&mut img, font, &card.title, TITLE_PX, TITLE_BASELINE);
        }
        if let Some(font) = &self.body_font {
            for (i, line) in card.lines.iter().enumerate() {
                let baseline = BODY_BASELINE + i as f32 * BODY_LINE_SPACING;
                self.draw_centered(&mut img, font, line, BODY_PX, baseline);
            }
        }
        if let Some(font) = &self.footer_font {
            let footer_baseline = self.height as f32 - FOOTER_OFFSET_FROM_BOTTOM;
            self.draw_centered(&mut img, font, &card.footer, FOOTER_PX, footer_baseline);
        }

        img.save(output).map_err(|e| BeaconError::Media {
            message: format!("failed to save card {}", output.display()),
            source: Some(Box::new(e)),
        })
    }
}

fn blend_white(px: &mut Rgb<u8>, alpha: u8) {
    let a = u16::from(alpha);
    for c in px.0.iter_mut() {
        *c = ((u16::from(*c) * (255 - a) + 255 * a) / 255) as u8;
    }
}

fn load_font(path: &Path) -> Option<Font> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read font, text will not be drawn");
            return None;
        }
    };
    match Font::from_bytes(bytes, FontSettings::default()) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not parse font, text will not be drawn");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> CardContent {
        CardContent {
            title: "MEETING IN PROGRESS".into(),
            lines: vec!["Back soon".into()],
            footer: "2:00 PM EST - 3:00 PM EST".into(),
        }
    }

    #[test]
    fn renders_gradient_card_without_fonts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("card.png");
        let renderer = FontCardRenderer::new(320, 200);
        assert!(!renderer.has_text());

        renderer.render(&card(), &out).unwrap();

        let img = image::open(&out).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (320, 200));
        assert_eq!(img.get_pixel(0, 0).0, [102, 126, 234]);
        assert_eq!(img.get_pixel(319, 199).0, [118, 75, 162]);
    }

    #[test]
    fn missing_font_degrades_to_textless() {
        let renderer = FontCardRenderer::with_font_paths(
            64,
            64,
            Some(Path::new("/nonexistent/font.ttf")),
            None,
            Some(Path::new("/nonexistent/regular.ttf")),
        );
        assert!(!renderer.has_text());
    }

    #[test]
    fn default_font_paths_draw_text_when_installed() {
        let media = beacon_config::model::MediaConfig::default();
        let paths = [
            media.title_font_path.as_deref().map(Path::new),
            media.body_font_path.as_deref().map(Path::new),
            media.footer_font_path.as_deref().map(Path::new),
        ];
        if !paths.iter().flatten().all(|p| p.exists()) {
            return;
        }
        let renderer = FontCardRenderer::with_font_paths(640, 400, paths[0], paths[1], paths[2]);
        assert!(renderer.has_text());

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("card.png");
        renderer.render(&card(), &out).unwrap();
        let img = image::open(&out).unwrap().to_rgb8();
        assert!(img.pixels().any(|px| px.0 == [255, 255, 255]));
    }

    #[test]
    fn unwritable_output_is_a_media_error() {
        let renderer = FontCardRenderer::new(64, 64);
        let err = renderer
            .render(&card(), Path::new("/nonexistent-dir/card.png"))
            .unwrap_err();
        assert!(matches!(err, BeaconError::Media { .. }));
    }

    #[test]
    fn blending_full_alpha_is_white() {
        let mut px = Rgb([10, 20, 30]);
        blend_white(&mut px, 255);
        assert_eq!(px.0, [255, 255, 255]);
        let mut untouched = Rgb([10, 20, 30]);
        blend_white(&mut untouched, 0);
        assert_eq!(untouched.0, [10, 20, 30]);
    }
}
