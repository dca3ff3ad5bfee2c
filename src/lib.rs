//! labelseg - point-prompted segmentation overlay client.
//!
//! A user clicks prompt points on an image; each click is mapped into image
//! space, sent to a SAM2-style segmentation service, and the returned mask
//! and box are merged into the current annotation object and drawn as an
//! overlay. Sessions can be exported as self-contained JSON or CSV
//! artifacts.
//!
//! ## Layout
//!
//! - [`coords`]: display ↔ image coordinate mapping
//! - [`codec`]: mask payload decoding and box-derived masks
//! - [`backend`]: HTTP client for the segmentation and detection services
//! - [`session`]: the annotation state machine
//! - [`render`]: overlay drawing onto any `OverlaySurface`
//! - [`format`]: artifact export
//! - [`config`]: persisted settings

pub mod backend;
pub mod codec;
pub mod color_utils;
pub mod config;
pub mod constants;
pub mod coords;
pub mod format;
pub mod model;
pub mod render;
pub mod session;

pub use backend::{BackendError, HttpBackend, SegmentationBackend};
pub use config::{AnnotatorConfig, ConfigError};
pub use coords::{ClientPoint, CoordinateSpace, DisplayRect, ImagePoint, MappingError};
pub use format::{ArtifactFormat, ExportError, ExportOptions, FormatRegistry};
pub use model::{AnnotationObject, BoundingBox, ImageFile, ImageSize, MaskData, ObjectId, Point, PointKind};
pub use session::{Session, SessionError, SessionOptions, SessionPhase, SessionSnapshot};

pub use labelseg_raster::{Color, DisplayList, OverlaySurface, PixmapSurface};
