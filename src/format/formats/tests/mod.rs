//! Unit tests for artifact format implementations.

mod json_tests;

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::coords::CoordinateSpace;
use crate::model::{AnnotationObject, BoundingBox, ImageFile, ImageSize, MaskCounts, MaskData, Point};
use crate::session::{LoadedImage, SessionPhase, SessionSnapshot};

/// 2026-03-01T12:00:00.250Z
fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap() + chrono::Duration::milliseconds(250)
}

/// Active session on a fake 64x48 PNG with one segmented and one empty object.
fn sample_snapshot() -> SessionSnapshot {
    let mut first = AnnotationObject::new(1);
    first.points.push(Point::positive(10.0, 12.0));
    first.points.push(Point::negative(30.5, 4.0));
    first.mask = Some(MaskData::new(48, 64, MaskCounts::Encoded("AAEC".into())));
    first.bbox = Some(BoundingBox::new(8.0, 2.0, 40.0, 20.0));
    first.set_confidence(0.875);

    SessionSnapshot {
        phase: SessionPhase::SessionActive,
        busy: false,
        session_id: Some("abc-123".into()),
        image: Some(LoadedImage {
            file: Arc::new(ImageFile::new("cat.png", "image/png", vec![1, 2, 3])),
            size: ImageSize::new(64, 48),
        }),
        objects: vec![first, AnnotationObject::new(2)],
        current_object_id: Some(2),
        coordinate_space: CoordinateSpace::Pixels,
    }
}
