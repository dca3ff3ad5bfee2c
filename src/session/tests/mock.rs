//! Scripted in-memory backend and helpers shared by the session tests.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::backend::api::StartSessionResponse;
use crate::backend::{
    AddPointRequest, AddPointResponse, AutoAnnotateRequest, AutoAnnotateResponse, BackendError,
    HealthResponse, SegmentationBackend, UploadResponse,
};
use crate::model::{BoundingBox, ImageFile};
use crate::session::{SessionEvent, SessionObserver};

/// Holds a request open until the test releases it.
#[derive(Default)]
pub struct Gate {
    /// Signalled when a gated request has arrived.
    pub entered: Notify,
    /// Signal to let the gated request answer.
    pub release: Notify,
}

/// Backend that answers from a script and records what it was asked.
#[derive(Default)]
pub struct MockBackend {
    pub calls: Mutex<Vec<&'static str>>,
    pub add_point_requests: Mutex<Vec<AddPointRequest>>,
    pub add_point_responses: Mutex<VecDeque<AddPointResponse>>,
    pub detections: Mutex<Option<AutoAnnotateResponse>>,
    pub fail_upload: AtomicBool,
    pub fail_start: AtomicBool,
    pub fail_add_point: AtomicBool,
    pub fail_clear: AtomicBool,
    pub fail_close: AtomicBool,
    /// Gate applied to the next `add_point`, `clear_points` or `upload`.
    pub gate: Mutex<Option<Arc<Gate>>>,
    sessions_started: AtomicU32,
    points_in_history: AtomicU32,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    pub fn network_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn set_gate(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn queue_add_point(&self, response: AddPointResponse) {
        self.add_point_responses.lock().unwrap().push_back(response);
    }

    pub fn last_add_point(&self) -> AddPointRequest {
        self.add_point_requests.lock().unwrap().last().cloned().unwrap()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    async fn pass_gate(&self) {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
    }

    fn failure(name: &str) -> BackendError {
        BackendError::Api {
            status: 500,
            body: format!("{} failed", name),
        }
    }
}

#[async_trait]
impl SegmentationBackend for MockBackend {
    async fn upload(&self, image: &ImageFile) -> Result<UploadResponse, BackendError> {
        self.record("upload");
        self.pass_gate().await;
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(Self::failure("upload"));
        }
        Ok(UploadResponse {
            path: format!("/uploads/{}", image.file_name),
        })
    }

    async fn start_session(&self, image_path: &str) -> Result<StartSessionResponse, BackendError> {
        self.record("start_session");
        assert!(image_path.starts_with("/uploads/"));
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(BackendError::Transport("connection refused".into()));
        }
        let n = self.sessions_started.fetch_add(1, Ordering::SeqCst) + 1;
        self.points_in_history.store(0, Ordering::SeqCst);
        Ok(StartSessionResponse {
            session_id: format!("session-{}", n),
        })
    }

    async fn add_point(&self, request: &AddPointRequest) -> Result<AddPointResponse, BackendError> {
        self.record("add_point");
        self.add_point_requests.lock().unwrap().push(request.clone());
        self.pass_gate().await;
        if self.fail_add_point.load(Ordering::SeqCst) {
            return Err(Self::failure("add_point"));
        }
        let total = self.points_in_history.fetch_add(1, Ordering::SeqCst) + 1;
        let scripted = self.add_point_responses.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or_else(|| {
            let [x, y] = request.point;
            AddPointResponse {
                mask: None,
                bbox: Some(BoundingBox::new(x - 2.0, y - 2.0, x + 2.0, y + 2.0)),
                score: Some(0.9),
                total_points: Some(total),
            }
        }))
    }

    async fn clear_points(&self, _session_id: &str) -> Result<(), BackendError> {
        self.record("clear_points");
        self.pass_gate().await;
        if self.fail_clear.load(Ordering::SeqCst) {
            return Err(Self::failure("clear_points"));
        }
        self.points_in_history.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn close_session(&self, _session_id: &str) -> Result<(), BackendError> {
        self.record("close_session");
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(Self::failure("close_session"));
        }
        Ok(())
    }

    async fn health(&self) -> Result<HealthResponse, BackendError> {
        self.record("health");
        Ok(HealthResponse {
            status: "healthy".into(),
            details: serde_json::Map::new(),
        })
    }

    async fn auto_annotate(
        &self,
        _image: &ImageFile,
        _request: &AutoAnnotateRequest,
    ) -> Result<AutoAnnotateResponse, BackendError> {
        self.record("auto_annotate");
        self.detections
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BackendError::Rejected("no detector configured".into()))
    }
}

/// Observer that keeps every event.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<SessionEvent>>,
}

impl RecordingObserver {
    pub fn errors(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, SessionEvent::Error(_)))
            .count()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_event(&self, event: &SessionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Encode a blank RGB image of the given size as PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::new(width, height);
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn png_file(width: u32, height: u32) -> ImageFile {
    ImageFile::new("sample.png", "image/png", png_bytes(width, height))
}
