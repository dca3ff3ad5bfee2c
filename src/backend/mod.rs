//! Client side of the segmentation service.
//!
//! [`SegmentationBackend`] is the seam the session talks through.
//! [`HttpBackend`] speaks the service's JSON/multipart API; tests plug in
//! scripted implementations.

pub mod api;
mod error;
mod http;

use async_trait::async_trait;

pub use api::{
    AddPointRequest, AddPointResponse, AutoAnnotateRequest, AutoAnnotateResponse, DetectedObject,
    DetectionImageInfo, HealthResponse, UploadResponse,
};
pub use error::BackendError;
pub use http::HttpBackend;

use crate::model::ImageFile;

/// Operations of the segmentation service.
///
/// The service keeps a single point history per session: every
/// `add_point` answer covers all points sent since the last
/// `clear_points`.
#[async_trait]
pub trait SegmentationBackend: Send + Sync {
    /// Store the image server-side and return its path.
    async fn upload(&self, image: &ImageFile) -> Result<UploadResponse, BackendError>;

    /// Open a session on an uploaded image.
    async fn start_session(
        &self,
        image_path: &str,
    ) -> Result<api::StartSessionResponse, BackendError>;

    async fn add_point(&self, request: &AddPointRequest) -> Result<AddPointResponse, BackendError>;

    /// Forget the session's point history.
    async fn clear_points(&self, session_id: &str) -> Result<(), BackendError>;

    /// Release server resources. Callers treat failures as advisory.
    async fn close_session(&self, session_id: &str) -> Result<(), BackendError>;

    async fn health(&self) -> Result<HealthResponse, BackendError>;

    /// Text-prompted detection over the whole image.
    async fn auto_annotate(
        &self,
        image: &ImageFile,
        request: &AutoAnnotateRequest,
    ) -> Result<AutoAnnotateResponse, BackendError>;
}
