//! Request and response bodies of the segmentation service.
//!
//! Field names follow the service's JSON exactly.

use serde::{Deserialize, Serialize};

use crate::model::{BoundingBox, MaskData};

/// Response of `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadResponse {
    /// Server-side path to pass to `start_session`.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartSessionRequest {
    pub image_path: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: String,
}

/// Body of `POST /api/add_point`. `point` is in native image pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddPointRequest {
    pub session_id: String,
    pub point: [f32; 2],
    /// 1 = foreground, 0 = background
    pub label: u8,
    pub clear_previous: bool,
}

/// Segmentation result for the session's whole point history.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AddPointResponse {
    #[serde(default)]
    pub mask: Option<MaskData>,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub total_points: Option<u32>,
}

/// Body for endpoints that only need the session id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRequest {
    pub session_id: String,
}

/// Response of `GET /api/health`. Anything besides `status` is kept as-is.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "healthy" | "ok")
    }
}

/// Text-prompted detection parameters. The image travels alongside.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoAnnotateRequest {
    /// Object classes separated by `.`, e.g. `"cat. dog."`
    pub text_prompt: String,
    pub box_threshold: f32,
    pub text_threshold: f32,
}

impl AutoAnnotateRequest {
    pub fn new(text_prompt: impl Into<String>) -> Self {
        Self {
            text_prompt: text_prompt.into(),
            box_threshold: crate::constants::DEFAULT_BOX_THRESHOLD,
            text_threshold: crate::constants::DEFAULT_TEXT_THRESHOLD,
        }
    }

    pub fn with_thresholds(mut self, box_threshold: f32, text_threshold: f32) -> Self {
        self.box_threshold = box_threshold;
        self.text_threshold = text_threshold;
        self
    }
}

/// One detection from `POST /api/auto_annotate`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DetectedObject {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub mask: Option<MaskData>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub detection_score: Option<f32>,
    #[serde(default)]
    pub segmentation_score: Option<f32>,
}

impl DetectedObject {
    /// `confidence`, or the detector's own score when that is missing.
    pub fn score(&self) -> Option<f32> {
        self.confidence.or(self.detection_score)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DetectionImageInfo {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AutoAnnotateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
    #[serde(default)]
    pub detection_count: Option<u32>,
    #[serde(default)]
    pub processing_time: Option<f64>,
    #[serde(default)]
    pub image_info: Option<DetectionImageInfo>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MaskCounts;

    #[test]
    fn test_add_point_request_shape() {
        let req = AddPointRequest {
            session_id: "abc".into(),
            point: [12.5, 40.0],
            label: 0,
            clear_previous: false,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "session_id": "abc",
                "point": [12.5, 40.0],
                "label": 0,
                "clear_previous": false
            })
        );
    }

    #[test]
    fn test_add_point_response_tolerates_nulls() {
        let resp: AddPointResponse =
            serde_json::from_str(r#"{"mask":null,"bbox":null,"score":0.5}"#).unwrap();
        assert!(resp.mask.is_none());
        assert!(resp.bbox.is_none());
        assert_eq!(resp.total_points, None);
    }

    #[test]
    fn test_add_point_response_full() {
        let resp: AddPointResponse = serde_json::from_str(
            r#"{"mask":{"size":[2,2],"counts":"AAEBAA=="},"bbox":[1,2,3,4],"score":0.93,"total_points":3}"#,
        )
        .unwrap();
        let mask = resp.mask.unwrap();
        assert_eq!(mask.counts, MaskCounts::Encoded("AAEBAA==".into()));
        assert_eq!(resp.bbox.unwrap().to_array(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(resp.total_points, Some(3));
    }

    #[test]
    fn test_detection_score_fallback() {
        let det: DetectedObject =
            serde_json::from_str(r#"{"label":"cat","detection_score":0.7}"#).unwrap();
        assert_eq!(det.score(), Some(0.7));

        let det: DetectedObject =
            serde_json::from_str(r#"{"confidence":0.9,"detection_score":0.7}"#).unwrap();
        assert_eq!(det.score(), Some(0.9));
    }

    #[test]
    fn test_health_keeps_extra_fields() {
        let health: HealthResponse =
            serde_json::from_str(r#"{"status":"healthy","device":"cuda","model_loaded":true}"#)
                .unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.details["device"], "cuda");
    }
}
