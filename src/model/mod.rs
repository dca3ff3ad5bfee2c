//! Data models for segmentation sessions.

mod annotation;
mod image;
mod mask;

pub use annotation::{AnnotationObject, BoundingBox, ImageSize, ObjectId, Point, PointKind};
pub use image::ImageFile;
pub use mask::{MaskCounts, MaskData};
