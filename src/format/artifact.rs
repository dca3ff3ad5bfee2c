//! Format-neutral view of a session for export.
//!
//! Both artifact formats flatten the same data; [`ArtifactData`] collects it
//! once from a [`SessionSnapshot`] and checks that there is something to
//! export.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::coords::CoordinateSpace;
use crate::format::error::ExportError;
use crate::format::traits::ExportOptions;
use crate::model::{AnnotationObject, BoundingBox, ImageFile, ImageSize, MaskData, ObjectId, Point};
use crate::session::SessionSnapshot;

/// Everything an artifact needs, borrowed from a snapshot.
#[derive(Debug, Clone)]
pub struct ArtifactData<'a> {
    pub session_id: &'a str,
    pub image: Arc<ImageFile>,
    pub image_size: ImageSize,
    pub coordinate_space: CoordinateSpace,
    pub objects: Vec<&'a AnnotationObject>,
    pub exported_at: DateTime<Utc>,
}

impl<'a> ArtifactData<'a> {
    /// Collect export data, applying `options`.
    pub fn from_snapshot(
        snapshot: &'a SessionSnapshot,
        options: &ExportOptions,
    ) -> Result<Self, ExportError> {
        let session_id = snapshot
            .session_id
            .as_deref()
            .ok_or(ExportError::NoSession)?;
        let image = snapshot.image.as_ref().ok_or(ExportError::NoImage)?;

        let objects = snapshot
            .objects
            .iter()
            .filter(|o| !(options.skip_empty_objects && o.is_empty()))
            .collect();

        Ok(Self {
            session_id,
            image: image.file.clone(),
            image_size: image.size,
            coordinate_space: snapshot.coordinate_space,
            objects,
            exported_at: options.exported_at.unwrap_or_else(Utc::now),
        })
    }

    /// ISO-8601 timestamp with milliseconds, e.g. `2026-03-01T12:00:00.000Z`.
    pub fn timestamp(&self) -> String {
        self.exported_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// One object as written to an artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedObject<'a> {
    pub id: ObjectId,
    pub points: &'a [Point],
    pub mask: Option<&'a MaskData>,
    pub bbox: Option<BoundingBox>,
    /// `#rrggbb`
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl<'a> From<&'a AnnotationObject> for ExportedObject<'a> {
    fn from(object: &'a AnnotationObject) -> Self {
        Self {
            id: object.id,
            points: &object.points,
            mask: object.mask.as_ref(),
            bbox: object.bbox,
            color: object.color.to_hex(),
            label: object.label.as_deref(),
            confidence: object.confidence,
        }
    }
}
