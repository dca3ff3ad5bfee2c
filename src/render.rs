//! Overlay rendering.
//!
//! [`render`] redraws every object from scratch onto an [`OverlaySurface`]
//! sized to the displayed image. Drawing coordinates are relative to the
//! image's top-left corner, so the surface is expected to sit exactly on top
//! of the image.

use labelseg_raster::{self as raster, Color, OverlaySurface, Rect};

use crate::codec;
use crate::color_utils::NEGATIVE_POINT_COLOR;
use crate::config::RenderConfig;
use crate::constants::{
    BBOX_DASH, BBOX_LABEL_FONT_SIZE, BBOX_LABEL_OFFSET, BBOX_LINE_WIDTH, CROSSHAIR_WIDTH,
    POINT_OUTLINE_WIDTH,
};
use crate::coords::{self, CoordinateSpace, DisplayRect, ImagePoint};
use crate::model::{AnnotationObject, BoundingBox, ImageSize, PointKind};

/// What to draw and how.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub show_mask: bool,
    pub show_bbox: bool,
    pub mask_opacity: f32,
    pub point_radius: f32,
    pub crosshair_half_length: f32,
    /// Space the objects' points are stored in
    pub space: CoordinateSpace,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default(), CoordinateSpace::default())
    }
}

impl RenderOptions {
    pub fn from_config(config: &RenderConfig, space: CoordinateSpace) -> Self {
        Self {
            show_mask: config.show_mask,
            show_bbox: config.show_bbox,
            mask_opacity: config.mask_opacity,
            point_radius: config.point_radius,
            crosshair_half_length: config.crosshair_half_length,
            space,
        }
    }
}

/// Redraw the overlay for `objects`.
///
/// The surface is always cleared first, to the display size rounded to whole
/// pixels. If the display rect or image size is unusable nothing else is
/// drawn. Objects are drawn in list order: mask, then box and size label,
/// then prompt points.
pub fn render<S: OverlaySurface + ?Sized>(
    surface: &mut S,
    objects: &[AnnotationObject],
    rect: DisplayRect,
    native: ImageSize,
    options: &RenderOptions,
) {
    let width = surface_extent(rect.width);
    let height = surface_extent(rect.height);
    surface.clear(width, height);

    let local = DisplayRect::sized(rect.width, rect.height);
    let scale = match coords::display_scale(local, native) {
        Ok(scale) => scale,
        Err(e) => {
            log::trace!("Skipping overlay pass: {}", e);
            return;
        }
    };

    for object in objects {
        if options.show_mask {
            if let Some(mask) = &object.mask {
                draw_mask(surface, object, mask, local, options.mask_opacity);
            }
        }
        if options.show_bbox {
            if let Some(bbox) = &object.bbox {
                draw_bbox(surface, bbox, object.color, scale);
            }
        }
        draw_points(surface, object, local, native, options);
    }

    log::trace!(
        "Rendered {} objects onto {}x{} overlay",
        objects.len(),
        width,
        height
    );
}

fn surface_extent(length: f32) -> u32 {
    if length.is_finite() && length > 0.0 {
        length.round() as u32
    } else {
        0
    }
}

fn draw_mask<S: OverlaySurface + ?Sized>(
    surface: &mut S,
    object: &AnnotationObject,
    mask: &crate::model::MaskData,
    local: DisplayRect,
    opacity: f32,
) {
    let decoded = codec::decode(mask);
    if decoded.data.is_empty() {
        return;
    }
    surface.fill_mask(
        decoded.as_layer(),
        object.color.with_opacity(opacity),
        Rect::new(0.0, 0.0, local.width, local.height),
    );
}

fn draw_bbox<S: OverlaySurface + ?Sized>(
    surface: &mut S,
    bbox: &BoundingBox,
    color: Color,
    (scale_x, scale_y): (f32, f32),
) {
    let rect = Rect::from_corners(
        bbox.x1 * scale_x,
        bbox.y1 * scale_y,
        bbox.x2 * scale_x,
        bbox.y2 * scale_y,
    );
    surface.stroke_rect(rect, color, BBOX_LINE_WIDTH, Some(BBOX_DASH));
    surface.fill_text(
        &size_label(bbox),
        raster::Point::new(rect.x, rect.y - BBOX_LABEL_OFFSET),
        color,
        BBOX_LABEL_FONT_SIZE,
    );
}

/// `"{w}×{h}"` in whole native pixels.
pub fn size_label(bbox: &BoundingBox) -> String {
    format!(
        "{}×{}",
        bbox.width().round() as i64,
        bbox.height().round() as i64
    )
}

fn draw_points<S: OverlaySurface + ?Sized>(
    surface: &mut S,
    object: &AnnotationObject,
    local: DisplayRect,
    native: ImageSize,
    options: &RenderOptions,
) {
    for point in &object.points {
        let Ok(center) = coords::to_display_space(
            ImagePoint::new(point.x, point.y),
            local,
            native,
            options.space,
        ) else {
            continue;
        };
        let (x, y) = (center.x, center.y);
        let fill = match point.kind {
            PointKind::Positive => object.color,
            PointKind::Negative => NEGATIVE_POINT_COLOR,
        };
        let center = raster::Point::new(x, y);
        let arm = options.crosshair_half_length;

        surface.fill_circle(center, options.point_radius, fill);
        surface.stroke_circle(center, options.point_radius, Color::WHITE, POINT_OUTLINE_WIDTH);
        surface.line(
            raster::Point::new(x - arm, y),
            raster::Point::new(x + arm, y),
            Color::WHITE,
            CROSSHAIR_WIDTH,
        );
        surface.line(
            raster::Point::new(x, y - arm),
            raster::Point::new(x, y + arm),
            Color::WHITE,
            CROSSHAIR_WIDTH,
        );
    }
}
