//! Annotation objects and their prompt geometry.

use labelseg_raster::Color;
use serde::{Deserialize, Serialize};

use crate::color_utils::palette_color;
use crate::model::mask::MaskData;

/// Identifier of an annotation object within a session. Starts at 1.
pub type ObjectId = u32;

/// Native pixel size of the loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Whether a prompt point marks foreground or background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    /// Foreground inclusion hint
    #[default]
    Positive,
    /// Background exclusion hint
    Negative,
}

impl PointKind {
    pub fn from_negative(is_negative: bool) -> Self {
        if is_negative {
            PointKind::Negative
        } else {
            PointKind::Positive
        }
    }

    /// Label sent to the backend: 1 for foreground, 0 for background.
    pub fn label(&self) -> u8 {
        match self {
            PointKind::Positive => 1,
            PointKind::Negative => 0,
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, PointKind::Negative)
    }
}

/// A prompt point, in the session's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: PointKind,
}

impl Point {
    pub fn new(x: f32, y: f32, kind: PointKind) -> Self {
        Self { x, y, kind }
    }

    pub fn positive(x: f32, y: f32) -> Self {
        Self::new(x, y, PointKind::Positive)
    }

    pub fn negative(x: f32, y: f32) -> Self {
        Self::new(x, y, PointKind::Negative)
    }
}

/// Axis-aligned box `[x1, y1, x2, y2]` in native image pixels.
///
/// Always normalized so that `x1 <= x2` and `y1 <= y2`. Serialized as a
/// four-element array, which is also the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    /// Create a box from two corners in any order.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Clip to `[0, width] x [0, height]`.
    pub fn clipped_to(&self, size: ImageSize) -> Self {
        let w = size.width as f32;
        let h = size.height as f32;
        Self {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
        }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(bbox: BoundingBox) -> Self {
        bbox.to_array()
    }
}

/// One logical thing being segmented within a session.
///
/// The backend only keeps a single point history per session; separate
/// objects exist only on the client, which clears the backend history
/// whenever it moves on to a new object.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationObject {
    pub id: ObjectId,
    /// Prompt points in click order
    pub points: Vec<Point>,
    /// Latest mask returned for this object
    pub mask: Option<MaskData>,
    pub bbox: Option<BoundingBox>,
    pub color: Color,
    pub label: Option<String>,
    /// Model score in `[0, 1]`
    pub confidence: Option<f32>,
}

impl AnnotationObject {
    /// Create an empty object with the palette color for `id`.
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            points: Vec::new(),
            mask: None,
            bbox: None,
            color: palette_color(id),
            label: None,
            confidence: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn set_confidence(&mut self, confidence: f32) {
        self.confidence = confidence.is_finite().then(|| confidence.clamp(0.0, 1.0));
    }

    /// Drop points, mask and box. Label and color are kept.
    pub fn clear_prompts(&mut self) {
        self.points.clear();
        self.mask = None;
        self.bbox = None;
    }

    /// True when the object carries no points, mask or box.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.mask.is_none() && self.bbox.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_utils::PALETTE;

    #[test]
    fn test_bbox_normalizes_corners() {
        let b = BoundingBox::new(52.0, 60.0, 48.0, 40.0);
        assert_eq!(b.to_array(), [48.0, 40.0, 52.0, 60.0]);
        assert_eq!(b.width(), 4.0);
        assert_eq!(b.height(), 20.0);
    }

    #[test]
    fn test_bbox_serializes_as_array() {
        let b = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(serde_json::to_string(&b).unwrap(), "[1.0,2.0,3.0,4.0]");

        let parsed: BoundingBox = serde_json::from_str("[10, 5, 2, 1]").unwrap();
        assert_eq!(parsed.to_array(), [2.0, 1.0, 10.0, 5.0]);
    }

    #[test]
    fn test_bbox_clip() {
        let b = BoundingBox::new(-5.0, 10.0, 120.0, 50.0).clipped_to(ImageSize::new(100, 40));
        assert_eq!(b.to_array(), [0.0, 10.0, 100.0, 40.0]);
    }

    #[test]
    fn test_point_kind_labels() {
        assert_eq!(PointKind::Positive.label(), 1);
        assert_eq!(PointKind::Negative.label(), 0);
        assert_eq!(PointKind::from_negative(true), PointKind::Negative);
    }

    #[test]
    fn test_point_serializes_type_field() {
        let json = serde_json::to_value(Point::negative(1.5, 2.0)).unwrap();
        assert_eq!(json["type"], "negative");
        assert_eq!(json["x"], 1.5);
    }

    #[test]
    fn test_new_object_uses_palette() {
        assert_eq!(AnnotationObject::new(1).color, PALETTE[0]);
        assert_eq!(AnnotationObject::new(3).color, PALETTE[2]);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let mut obj = AnnotationObject::new(1);
        obj.set_confidence(1.7);
        assert_eq!(obj.confidence, Some(1.0));
        obj.set_confidence(f32::NAN);
        assert_eq!(obj.confidence, None);
    }

    #[test]
    fn test_clear_prompts_keeps_identity() {
        let mut obj = AnnotationObject::new(2).with_label("cat");
        obj.points.push(Point::positive(1.0, 1.0));
        obj.bbox = Some(BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        obj.clear_prompts();
        assert!(obj.is_empty());
        assert_eq!(obj.label.as_deref(), Some("cat"));
        assert_eq!(obj.id, 2);
    }
}
