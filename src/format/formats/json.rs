//! JSON artifact.
//!
//! A pretty-printed document carrying the image as a data URI together with
//! every object's points, mask, box and color:
//!
//! ```json
//! {
//!   "image": "data:image/png;base64,...",
//!   "sessionId": "...",
//!   "coordinateSpace": "pixels",
//!   "annotations": [{ "id": 1, "points": [...], "mask": null, "bbox": null, "color": "#ff6b6b" }],
//!   "timestamp": "2026-03-01T12:00:00.000Z"
//! }
//! ```

use serde::Serialize;

use crate::coords::CoordinateSpace;
use crate::format::artifact::{ArtifactData, ExportedObject};
use crate::format::error::ExportError;
use crate::format::traits::ArtifactFormat;

/// Full-fidelity JSON artifact.
pub struct JsonArtifact;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonDocument<'a> {
    image: String,
    session_id: &'a str,
    coordinate_space: CoordinateSpace,
    annotations: Vec<ExportedObject<'a>>,
    timestamp: String,
}

impl ArtifactFormat for JsonArtifact {
    fn id(&self) -> &'static str {
        "json"
    }

    fn display_name(&self) -> &'static str {
        "Annotations (JSON)"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn write_artifact(&self, data: &ArtifactData<'_>) -> Result<Vec<u8>, ExportError> {
        let document = JsonDocument {
            image: data.image.data_uri(),
            session_id: data.session_id,
            coordinate_space: data.coordinate_space,
            annotations: data.objects.iter().map(|o| ExportedObject::from(*o)).collect(),
            timestamp: data.timestamp(),
        };
        Ok(serde_json::to_vec_pretty(&document)?)
    }
}
