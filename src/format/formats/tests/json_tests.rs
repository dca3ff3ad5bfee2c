//! Tests for the JSON artifact.

use serde_json::{Value, json};

use super::{fixed_time, sample_snapshot};
use crate::format::error::ExportError;
use crate::format::formats::JsonArtifact;
use crate::format::traits::{ArtifactFormat, ExportOptions};

fn export(options: ExportOptions) -> Value {
    let bytes = JsonArtifact
        .export_to_bytes(&sample_snapshot(), &options.exported_at(fixed_time()))
        .expect("export");
    serde_json::from_slice(&bytes).expect("valid JSON")
}

#[test]
fn test_document_fields() {
    let doc = export(ExportOptions::new());

    assert_eq!(doc["image"], "data:image/png;base64,AQID");
    assert_eq!(doc["sessionId"], "abc-123");
    assert_eq!(doc["coordinateSpace"], "pixels");
    assert_eq!(doc["timestamp"], "2026-03-01T12:00:00.250Z");
}

#[test]
fn test_segmented_object() {
    let doc = export(ExportOptions::new());
    let first = &doc["annotations"][0];

    assert_eq!(first["id"], 1);
    assert_eq!(
        first["points"],
        json!([
            {"x": 10.0, "y": 12.0, "type": "positive"},
            {"x": 30.5, "y": 4.0, "type": "negative"}
        ])
    );
    assert_eq!(first["mask"], json!({"size": [48, 64], "counts": "AAEC"}));
    assert_eq!(first["bbox"], json!([8.0, 2.0, 40.0, 20.0]));
    assert_eq!(first["color"], "#1890ff");
    assert_eq!(first["confidence"], 0.875);
    assert!(first.get("label").is_none());
}

#[test]
fn test_empty_objects_exported_by_default() {
    let doc = export(ExportOptions::new());
    let annotations = doc["annotations"].as_array().unwrap();
    assert_eq!(annotations.len(), 2);

    let empty = &annotations[1];
    assert_eq!(empty["id"], 2);
    assert_eq!(empty["points"], json!([]));
    assert!(empty["mask"].is_null());
    assert!(empty["bbox"].is_null());
    assert_eq!(empty["color"], "#52c41a");
    assert!(empty.get("confidence").is_none());
}

#[test]
fn test_skip_empty_objects() {
    let doc = export(ExportOptions::new().skip_empty_objects(true));
    assert_eq!(doc["annotations"].as_array().unwrap().len(), 1);
}

#[test]
fn test_label_exported_when_present() {
    let mut snapshot = sample_snapshot();
    snapshot.objects[1].label = Some("dog".into());
    let bytes = JsonArtifact
        .export_to_bytes(&snapshot, &ExportOptions::new())
        .unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(doc["annotations"][1]["label"], "dog");
}

#[test]
fn test_percent_space_recorded() {
    let mut snapshot = sample_snapshot();
    snapshot.coordinate_space = crate::coords::CoordinateSpace::Percent;
    let bytes = JsonArtifact
        .export_to_bytes(&snapshot, &ExportOptions::new())
        .unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(doc["coordinateSpace"], "percent");
}

#[test]
fn test_requires_session_and_image() {
    let mut snapshot = sample_snapshot();
    snapshot.image = None;
    assert!(matches!(
        JsonArtifact.export_to_bytes(&snapshot, &ExportOptions::new()),
        Err(ExportError::NoImage)
    ));

    snapshot.session_id = None;
    assert!(matches!(
        JsonArtifact.export_to_bytes(&snapshot, &ExportOptions::new()),
        Err(ExportError::NoSession)
    ));
}

#[test]
fn test_export_writes_named_file() {
    let dir = std::env::temp_dir().join(format!("labelseg-json-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let result = JsonArtifact
        .export(
            &sample_snapshot(),
            &dir,
            &ExportOptions::new().exported_at(fixed_time()),
        )
        .unwrap();

    let expected = format!("sam2_annotations_{}.json", fixed_time().timestamp_millis());
    assert_eq!(result.path, dir.join(expected));
    assert_eq!(result.objects_exported, 2);
    assert_eq!(
        std::fs::metadata(&result.path).unwrap().len() as usize,
        result.bytes_written
    );

    std::fs::remove_dir_all(&dir).ok();
}
