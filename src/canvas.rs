//! Canvas - fixed-size RGBA render surface
//!
//! Mirrors the handful of 2D-context calls a badge needs: clear, draw an
//! image stretched to fill, fill text at an anchor.

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageEncoder, Rgba, RgbaImage};

use crate::error::{BadgeError, Result};
use crate::layout::Align;

pub const CANVAS_WIDTH: u32 = 1310;
pub const CANVAS_HEIGHT: u32 = 2048;

/// `#222`
pub const TEXT_COLOR: Rgba<u8> = Rgba([0x22, 0x22, 0x22, 0xff]);

#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pixels: RgbaImage,
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            pixels: RgbaImage::new(CANVAS_WIDTH, CANVAS_HEIGHT),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    /// Draw `img` stretched over the whole surface.
    pub fn draw_image(&mut self, img: &DynamicImage) {
        let rgba = img.to_rgba8();
        let (w, h) = (self.width(), self.height());
        if rgba.dimensions() == (w, h) {
            imageops::overlay(&mut self.pixels, &rgba, 0, 0);
        } else {
            let scaled = imageops::resize(&rgba, w, h, FilterType::Triangle);
            imageops::overlay(&mut self.pixels, &scaled, 0, 0);
        }
    }

    /// Fill `text` anchored at (`x`, `y`), vertically centered on `y`.
    ///
    /// `size_px` is a CSS pixel font size (the em box height).
    pub fn fill_text(&mut self, text: &str, font: &FontArc, size_px: f32, align: &Align, x: f32, y: f32, color: Rgba<u8>) {
        if text.is_empty() || size_px <= 0.0 {
            return;
        }

        let scale = px_scale(font, size_px);
        let scaled = font.as_scaled(scale);

        let mut glyphs: Vec<(GlyphId, f32)> = Vec::new();
        let mut caret = 0.0f32;
        let mut prev: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = font.glyph_id(ch);
            if let Some(p) = prev {
                caret += scaled.kern(p, id);
            }
            glyphs.push((id, caret));
            caret += scaled.h_advance(id);
            prev = Some(id);
        }

        let start_x = match align {
            Align::Center => x - caret / 2.0,
            Align::Right | Align::End => x - caret,
            _ => x,
        };
        // middle baseline: halfway between ascent and descent
        let baseline = y + (scaled.ascent() + scaled.descent()) / 2.0;

        let (w, h) = (self.width() as i32, self.height() as i32);
        for (id, offset) in glyphs {
            let glyph = id.with_scale_and_position(scale, point(start_x + offset, baseline));
            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            let pixels = &mut self.pixels;
            outlined.draw(|gx, gy, coverage| {
                let px = gx as i32 + bounds.min.x as i32;
                let py = gy as i32 + bounds.min.y as i32;
                if px < 0 || py < 0 || px >= w || py >= h {
                    return;
                }
                let dst = pixels.get_pixel_mut(px as u32, py as u32);
                blend(dst, color, coverage.clamp(0.0, 1.0));
            });
        }
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(
                self.pixels.as_raw(),
                self.width(),
                self.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| BadgeError::Image(format!("PNG encode failed: {}", e)))?;
        Ok(out)
    }

    /// `data:image/png;base64,...`
    pub fn to_data_url(&self) -> Result<String> {
        let png = self.encode_png()?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::Engine::encode(&base64::engine::general_purpose::STANDARD, png)
        ))
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

/// CSS px sizes are em heights; ab_glyph scales by ascent-descent height.
fn px_scale(font: &FontArc, size_px: f32) -> PxScale {
    font.pt_to_px_scale(size_px * 0.75)
        .unwrap_or_else(|| PxScale::from(size_px))
}

fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: f32) {
    let a = (src[3] as f32 / 255.0) * coverage;
    if a <= 0.0 {
        return;
    }
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = a + dst_a * (1.0 - a);
    for c in 0..3 {
        let s = src[c] as f32 / 255.0;
        let d = dst[c] as f32 / 255.0;
        let v = (s * a + d * dst_a * (1.0 - a)) / out_a;
        dst[c] = (v * 255.0).round() as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba(color)))
    }

    #[test]
    fn test_fixed_dimensions() {
        let canvas = Canvas::new();
        assert_eq!((canvas.width(), canvas.height()), (1310, 2048));
    }

    #[test]
    fn test_draw_image_stretches_to_fill() {
        let mut canvas = Canvas::new();
        canvas.draw_image(&solid(4, 4, [10, 20, 30, 255]));
        assert_eq!(*canvas.pixels().get_pixel(0, 0), Rgba([10, 20, 30, 255]));
        assert_eq!(*canvas.pixels().get_pixel(1309, 2047), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_clear_then_draw_does_not_blend_previous() {
        let mut canvas = Canvas::new();
        canvas.draw_image(&solid(2, 2, [255, 0, 0, 255]));
        canvas.clear();
        canvas.draw_image(&solid(2, 2, [0, 0, 255, 128]));
        let px = canvas.pixels().get_pixel(5, 5);
        assert_eq!(px[0], 0);
        assert_eq!(px[2], 255);
    }

    #[test]
    fn test_blend_full_coverage_replaces() {
        let mut px = Rgba([255, 255, 255, 255]);
        blend(&mut px, TEXT_COLOR, 1.0);
        assert_eq!(px, TEXT_COLOR);
    }

    #[test]
    fn test_blend_zero_coverage_keeps() {
        let mut px = Rgba([1, 2, 3, 4]);
        blend(&mut px, TEXT_COLOR, 0.0);
        assert_eq!(px, Rgba([1, 2, 3, 4]));
    }

    #[test]
    fn test_png_and_data_url() {
        let mut canvas = Canvas::new();
        canvas.draw_image(&solid(1, 1, [200, 200, 200, 255]));
        let png = canvas.encode_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (CANVAS_WIDTH, CANVAS_HEIGHT));
        assert!(canvas.to_data_url().unwrap().starts_with("data:image/png;base64,iVBOR"));
    }
}
