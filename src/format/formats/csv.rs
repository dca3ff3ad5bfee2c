//! CSV artifact.
//!
//! Two columns and a single data row: the Base64 image and a compact JSON
//! summary of the session. Both fields are quoted; quotes inside the JSON
//! are doubled.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::format::artifact::ArtifactData;
use crate::format::error::ExportError;
use crate::format::traits::ArtifactFormat;
use crate::model::{AnnotationObject, Point};

pub const CSV_HEADER: &str = "image_base64,annotation_json";

/// Single-row CSV artifact.
pub struct CsvArtifact;

#[derive(Serialize)]
struct CsvSummary<'a> {
    session_id: &'a str,
    image_info: ImageInfo<'a>,
    objects: ObjectMap<'a>,
}

#[derive(Serialize)]
struct ImageInfo<'a> {
    width: u32,
    height: u32,
    format: &'a str,
}

#[derive(Serialize)]
struct ObjectSummary<'a> {
    points: &'a [Point],
    total_points: usize,
    has_mask: bool,
    has_bbox: bool,
}

/// Objects keyed by their id as a string, in session order.
struct ObjectMap<'a>(&'a [&'a AnnotationObject]);

impl Serialize for ObjectMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for object in self.0 {
            let summary = ObjectSummary {
                points: &object.points,
                total_points: object.points.len(),
                has_mask: object.mask.is_some(),
                has_bbox: object.bbox.is_some(),
            };
            map.serialize_entry(&object.id.to_string(), &summary)?;
        }
        map.end()
    }
}

/// Quote a CSV field, doubling embedded quotes.
pub fn quote_field(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

impl ArtifactFormat for CsvArtifact {
    fn id(&self) -> &'static str {
        "csv"
    }

    fn display_name(&self) -> &'static str {
        "Annotations (CSV)"
    }

    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write_artifact(&self, data: &ArtifactData<'_>) -> Result<Vec<u8>, ExportError> {
        let summary = CsvSummary {
            session_id: data.session_id,
            image_info: ImageInfo {
                width: data.image_size.width,
                height: data.image_size.height,
                format: data.image.format(),
            },
            objects: ObjectMap(&data.objects),
        };
        let json = serde_json::to_string(&summary)?;

        let mut out = String::with_capacity(CSV_HEADER.len() + json.len() + data.image.bytes.len() * 2);
        out.push_str(CSV_HEADER);
        out.push('\n');
        out.push_str(&quote_field(&data.image.base64()));
        out.push(',');
        out.push_str(&quote_field(&json));
        out.push('\n');
        Ok(out.into_bytes())
    }
}
