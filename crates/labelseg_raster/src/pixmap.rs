//! CPU rasterizer backed by `tiny-skia`.

use thiserror::Error;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, StrokeDash,
    Transform,
};

use crate::color::Color;
use crate::surface::{MaskLayer, OverlaySurface, Point, Rect};

/// Errors from pixmap output.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The surface has never been cleared to a non-zero size.
    #[error("surface has no pixels (size is zero or clear() was never called)")]
    EmptySurface,

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// A text label that was requested but not rasterized.
///
/// `tiny-skia` has no text shaping, so labels are kept for the caller to
/// draw with whatever font stack it has.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub position: Point,
    pub color: Color,
    pub size: f32,
}

/// Overlay surface that rasterizes into an RGBA pixmap.
#[derive(Default)]
pub struct PixmapSurface {
    pixmap: Option<Pixmap>,
    labels: Vec<TextLabel>,
}

impl PixmapSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> u32 {
        self.pixmap.as_ref().map_or(0, Pixmap::width)
    }

    pub fn height(&self) -> u32 {
        self.pixmap.as_ref().map_or(0, Pixmap::height)
    }

    /// Text labels recorded since the last clear.
    pub fn labels(&self) -> &[TextLabel] {
        &self.labels
    }

    /// Demultiplied RGBA of one pixel, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let px = self.pixmap.as_ref()?.pixel(x, y)?.demultiply();
        Some(Color::new(px.red(), px.green(), px.blue(), px.alpha()))
    }

    /// Premultiplied RGBA bytes, row-major.
    pub fn data(&self) -> &[u8] {
        match &self.pixmap {
            Some(p) => p.data(),
            None => &[],
        }
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        let pixmap = self.pixmap.as_ref().ok_or(RasterError::EmptySurface)?;
        pixmap
            .encode_png()
            .map_err(|e| RasterError::Encode(e.to_string()))
    }

    fn paint(color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = true;
        paint
    }

    fn stroke(width: f32, dash: Option<[f32; 2]>) -> Stroke {
        Stroke {
            width,
            dash: dash.and_then(|[on, off]| StrokeDash::new(vec![on, off], 0.0)),
            ..Stroke::default()
        }
    }
}

impl OverlaySurface for PixmapSurface {
    fn clear(&mut self, width: u32, height: u32) {
        self.labels.clear();
        match &mut self.pixmap {
            Some(p) if p.width() == width && p.height() == height => {
                p.fill(tiny_skia::Color::TRANSPARENT);
            }
            _ => {
                self.pixmap = Pixmap::new(width, height);
                if self.pixmap.is_none() {
                    log::debug!("PixmapSurface: cleared to empty {}x{} surface", width, height);
                }
            }
        }
    }

    fn fill_mask(&mut self, mask: MaskLayer<'_>, color: Color, dest: Rect) {
        let Some(target) = self.pixmap.as_mut() else {
            return;
        };
        if !mask.is_consistent() {
            log::warn!(
                "PixmapSurface: mask buffer has {} bytes, expected {}x{}",
                mask.coverage.len(),
                mask.width,
                mask.height
            );
            return;
        }
        let Some(mut layer) = Pixmap::new(mask.width, mask.height) else {
            return;
        };

        let fg = ColorU8::from_rgba(color.r, color.g, color.b, color.a).premultiply();
        for (px, &value) in layer.pixels_mut().iter_mut().zip(mask.coverage) {
            if value > 0 {
                *px = fg;
            }
        }

        let transform = Transform::from_row(
            dest.width / mask.width as f32,
            0.0,
            0.0,
            dest.height / mask.height as f32,
            dest.x,
            dest.y,
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Nearest,
            ..PixmapPaint::default()
        };
        target.draw_pixmap(0, 0, layer.as_ref(), &paint, transform, None);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32, dash: Option<[f32; 2]>) {
        let Some(target) = self.pixmap.as_mut() else {
            return;
        };
        let Some(r) = tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) else {
            return;
        };
        let path = PathBuilder::from_rect(r);
        target.stroke_path(
            &path,
            &Self::paint(color),
            &Self::stroke(width, dash),
            Transform::identity(),
            None,
        );
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        let Some(target) = self.pixmap.as_mut() else {
            return;
        };
        if let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) {
            target.fill_path(
                &path,
                &Self::paint(color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, color: Color, width: f32) {
        let Some(target) = self.pixmap.as_mut() else {
            return;
        };
        if let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) {
            target.stroke_path(
                &path,
                &Self::paint(color),
                &Self::stroke(width, None),
                Transform::identity(),
                None,
            );
        }
    }

    fn line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        let Some(target) = self.pixmap.as_mut() else {
            return;
        };
        let mut pb = PathBuilder::new();
        pb.move_to(from.x, from.y);
        pb.line_to(to.x, to.y);
        if let Some(path) = pb.finish() {
            target.stroke_path(
                &path,
                &Self::paint(color),
                &Self::stroke(width, None),
                Transform::identity(),
                None,
            );
        }
    }

    fn fill_text(&mut self, text: &str, position: Point, color: Color, size: f32) {
        log::trace!("PixmapSurface: label '{}' at ({}, {})", text, position.x, position.y);
        self.labels.push(TextLabel {
            text: text.to_string(),
            position,
            color,
            size,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_allocates_transparent_surface() {
        let mut surface = PixmapSurface::new();
        surface.clear(8, 4);
        assert_eq!((surface.width(), surface.height()), (8, 4));
        assert!(surface.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_zero_sized_clear_is_empty() {
        let mut surface = PixmapSurface::new();
        surface.clear(0, 10);
        assert_eq!(surface.width(), 0);
        assert!(matches!(surface.encode_png(), Err(RasterError::EmptySurface)));
    }

    #[test]
    fn test_fill_mask_scales_to_destination() {
        let mut surface = PixmapSurface::new();
        surface.clear(4, 4);
        // 2x2 mask with only the top-left pixel set, drawn over the whole surface
        let coverage = [1u8, 0, 0, 0];
        let mask = MaskLayer {
            width: 2,
            height: 2,
            coverage: &coverage,
        };
        surface.fill_mask(mask, Color::rgb(255, 0, 0), Rect::new(0.0, 0.0, 4.0, 4.0));

        let covered = surface.pixel(1, 1).unwrap();
        assert_eq!((covered.r, covered.a), (255, 255));
        assert_eq!(surface.pixel(3, 3).unwrap().a, 0);
    }

    #[test]
    fn test_clear_resets_pixels_and_labels() {
        let mut surface = PixmapSurface::new();
        surface.clear(10, 10);
        surface.fill_circle(Point::new(5.0, 5.0), 3.0, Color::WHITE);
        surface.fill_text("3×3", Point::new(0.0, 0.0), Color::WHITE, 12.0);
        assert!(surface.pixel(5, 5).unwrap().a > 0);
        assert_eq!(surface.labels().len(), 1);

        surface.clear(10, 10);
        assert_eq!(surface.pixel(5, 5).unwrap().a, 0);
        assert!(surface.labels().is_empty());
    }

    #[test]
    fn test_encode_png_has_signature() {
        let mut surface = PixmapSurface::new();
        surface.clear(2, 2);
        let png = surface.encode_png().unwrap();
        assert_eq!(&png[..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
    }
}
