//! Global constants for the annotator

/// Port the segmentation service listens on
pub const DEFAULT_BACKEND_PORT: u16 = 5000;

/// Per-request timeout for backend calls
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Largest image accepted for upload (10 MiB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Detector box confidence threshold
pub const DEFAULT_BOX_THRESHOLD: f32 = 0.35;

/// Detector text match threshold
pub const DEFAULT_TEXT_THRESHOLD: f32 = 0.25;

/// Mask fill opacity
pub const DEFAULT_MASK_OPACITY: f32 = 0.5;

/// Prompt point radius in display pixels
pub const POINT_RADIUS: f32 = 5.0;

/// White outline around prompt points
pub const POINT_OUTLINE_WIDTH: f32 = 2.0;

/// Half length of the cross-hair through each point
pub const CROSSHAIR_HALF_LENGTH: f32 = 10.0;

pub const CROSSHAIR_WIDTH: f32 = 2.0;

/// Bounding box stroke width
pub const BBOX_LINE_WIDTH: f32 = 3.0;

/// Bounding box dash pattern (on, off)
pub const BBOX_DASH: [f32; 2] = [5.0, 5.0];

/// Gap between the top edge of a box and its size label
pub const BBOX_LABEL_OFFSET: f32 = 5.0;

pub const BBOX_LABEL_FONT_SIZE: f32 = 12.0;

/// Prefix of exported artifact file names
pub const ARTIFACT_FILE_PREFIX: &str = "sam2_annotations";
