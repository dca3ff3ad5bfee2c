//! The annotation session state machine.
//!
//! A [`Session`] owns everything about one image being segmented: the local
//! image, the backend session id, the annotation objects and which of them
//! is current. It drives a [`SegmentationBackend`] and never blocks on it
//! while holding its lock.
//!
//! Phases move `NoImage -> ImageLoaded -> SessionStarting -> SessionActive`.
//! Resetting returns an active session to `ImageLoaded`. Independently of
//! the phase, a busy flag allows only one network operation at a time.
//!
//! Each network operation remembers the generation it started in. Loading
//! an image or resetting bumps the generation, and any response that comes
//! back afterwards is dropped as [`SessionError::Superseded`] without
//! touching state.

mod error;
mod observer;
mod state;

#[cfg(test)]
mod tests;

use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use error::SessionError;
pub use observer::{LogObserver, SessionEvent, SessionObserver};
pub use state::{LoadedImage, SessionPhase, SessionSnapshot};

use state::SessionState;

use crate::backend::api::StartSessionResponse;
use crate::backend::{
    AddPointRequest, AutoAnnotateRequest, AutoAnnotateResponse, BackendError, HealthResponse,
    SegmentationBackend,
};
use crate::config::AnnotatorConfig;
use crate::constants::MAX_UPLOAD_BYTES;
use crate::coords::{self, ClientPoint, CoordinateSpace, DisplayRect, ImagePoint};
use crate::model::{AnnotationObject, ImageFile, ImageSize, ObjectId, Point, PointKind};

/// Fixed per-session settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    /// Space points are stored in. The backend always receives native pixels.
    pub coordinate_space: CoordinateSpace,
    pub max_upload_bytes: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            coordinate_space: CoordinateSpace::default(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &AnnotatorConfig) -> Self {
        Self {
            coordinate_space: config.coordinate_space,
            max_upload_bytes: config.upload.max_file_size_bytes,
        }
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks one network operation as in flight.
///
/// Dropping it without [`reacquire`](Self::reacquire) (an error path or a
/// cancelled future) clears the busy flag and backs out of
/// `SessionStarting`, unless the session was reset in the meantime.
struct InFlight<'a> {
    state: &'a Mutex<SessionState>,
    generation: u64,
    operation: &'static str,
    armed: bool,
}

impl<'a> InFlight<'a> {
    /// Lock the state again once the response is in.
    ///
    /// Fails with `Superseded` when the session was reset or replaced while
    /// waiting; the busy flag then belongs to whoever reset it.
    fn reacquire(&mut self) -> Result<MutexGuard<'a, SessionState>, SessionError> {
        self.armed = false;
        let mut state = lock(self.state);
        if state.generation != self.generation {
            log::warn!(
                "Discarding stale {} response (generation {} is now {})",
                self.operation,
                self.generation,
                state.generation
            );
            return Err(SessionError::Superseded(self.operation));
        }
        state.busy = false;
        Ok(state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = lock(self.state);
        if state.generation == self.generation {
            state.busy = false;
            if state.phase == SessionPhase::SessionStarting {
                state.phase = SessionPhase::ImageLoaded;
            }
        }
    }
}

/// One interactive segmentation session over a [`SegmentationBackend`].
pub struct Session<B> {
    backend: B,
    options: SessionOptions,
    state: Mutex<SessionState>,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl<B: SegmentationBackend> Session<B> {
    pub fn new(backend: B, options: SessionOptions) -> Self {
        Self {
            backend,
            options,
            state: Mutex::new(SessionState::default()),
            observer: None,
        }
    }

    /// Attach an observer for progress and error notices.
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    pub fn current_object_id(&self) -> Option<ObjectId> {
        self.lock().current_object_id
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot(self.options.coordinate_space)
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }

    fn status(&self, text: &str) {
        self.emit(SessionEvent::Status(text.to_string()));
    }

    /// Report a failure to the observer and hand it back.
    fn fail(&self, error: SessionError) -> SessionError {
        if !matches!(error, SessionError::Superseded(_)) {
            self.emit(SessionEvent::Error(error.to_string()));
        }
        error
    }

    fn begin<'a>(&'a self, state: &mut SessionState, operation: &'static str) -> InFlight<'a> {
        state.busy = true;
        InFlight {
            state: &self.state,
            generation: state.generation,
            operation,
            armed: true,
        }
    }

    fn require_active(state: &SessionState, operation: &'static str) -> Result<String, SessionError> {
        match (state.phase, &state.session_id) {
            (SessionPhase::SessionActive, _) if state.busy => Err(SessionError::Busy(operation)),
            (SessionPhase::SessionActive, Some(id)) => Ok(id.clone()),
            (SessionPhase::SessionStarting, _) => Err(SessionError::Busy(operation)),
            (phase, _) => Err(SessionError::StateViolation { operation, phase }),
        }
    }

    /// Validate and adopt a new source image. Performs no network I/O.
    ///
    /// Any previous session, objects and in-flight responses are dropped.
    pub fn load_image(&self, file: ImageFile) -> Result<ImageSize, SessionError> {
        let size = self
            .inspect_image(&file)
            .map_err(|e| self.fail(e))?;

        let file_name = file.file_name.clone();
        {
            let mut state = self.lock();
            state.load(LoadedImage {
                file: Arc::new(file),
                size,
            });
        }
        log::info!(
            "Loaded image '{}' ({}x{})",
            file_name,
            size.width,
            size.height
        );
        self.emit(SessionEvent::ImageLoaded { file_name, size });
        Ok(size)
    }

    fn inspect_image(&self, file: &ImageFile) -> Result<ImageSize, SessionError> {
        if !file.is_image() {
            return Err(SessionError::InvalidInput(format!(
                "'{}' has type '{}', expected an image",
                file.file_name, file.mime_type
            )));
        }
        if file.bytes.len() > self.options.max_upload_bytes {
            return Err(SessionError::InvalidInput(format!(
                "'{}' is {} bytes, the limit is {} bytes",
                file.file_name,
                file.bytes.len(),
                self.options.max_upload_bytes
            )));
        }
        let (width, height) = image::ImageReader::new(Cursor::new(&file.bytes))
            .with_guessed_format()
            .map_err(|e| SessionError::InvalidInput(format!("'{}': {}", file.file_name, e)))?
            .into_dimensions()
            .map_err(|e| {
                SessionError::InvalidInput(format!(
                    "'{}' could not be decoded: {}",
                    file.file_name, e
                ))
            })?;
        let size = ImageSize::new(width, height);
        if size.is_empty() {
            return Err(SessionError::InvalidInput(format!(
                "'{}' has no pixels ({}x{})",
                file.file_name, width, height
            )));
        }
        Ok(size)
    }

    /// Upload the image and open a backend session.
    ///
    /// On success object 1 exists and is current.
    pub async fn start_session(&self) -> Result<String, SessionError> {
        const OP: &str = "start_session";

        let prepared = {
            let mut state = self.lock();
            let image = state.image.as_ref().map(|i| i.file.clone());
            match (state.phase, image) {
                (SessionPhase::ImageLoaded, Some(image)) => {
                    state.phase = SessionPhase::SessionStarting;
                    Ok((self.begin(&mut state, OP), image))
                }
                (SessionPhase::SessionStarting, _) => Err(SessionError::Busy(OP)),
                (phase, _) => Err(SessionError::StateViolation {
                    operation: OP,
                    phase,
                }),
            }
        };
        let (mut in_flight, image) = prepared.map_err(|e| self.fail(e))?;

        self.status("Uploading image...");
        let outcome: Result<StartSessionResponse, BackendError> = async {
            let uploaded = self.backend.upload(&image).await?;
            log::debug!("Image stored by backend at {}", uploaded.path);
            self.status("Starting session...");
            self.backend.start_session(&uploaded.path).await
        }
        .await;

        let superseded = match in_flight.reacquire() {
            Ok(state) => return self.finish_start(state, outcome),
            Err(e) => e,
        };
        // The backend opened a session nobody will use
        if let Ok(orphan) = &outcome {
            self.close_quietly(&orphan.session_id).await;
        }
        Err(superseded)
    }

    fn finish_start(
        &self,
        mut state: MutexGuard<'_, SessionState>,
        outcome: Result<StartSessionResponse, BackendError>,
    ) -> Result<String, SessionError> {
        match outcome {
            Ok(response) => {
                state.activate(response.session_id.clone());
                drop(state);
                log::info!("🟢 Session {} started", response.session_id);
                self.emit(SessionEvent::SessionStarted {
                    session_id: response.session_id.clone(),
                });
                Ok(response.session_id)
            }
            Err(e) => {
                state.phase = SessionPhase::ImageLoaded;
                drop(state);
                log::warn!("Session start failed: {}", e);
                Err(self.fail(SessionError::SessionStartFailed(e)))
            }
        }
    }

    /// Add a prompt point from a click at `client` on an image drawn at `rect`.
    ///
    /// Returns the current object after the backend's answer was merged.
    pub async fn add_point(
        &self,
        client: ClientPoint,
        rect: DisplayRect,
        kind: PointKind,
    ) -> Result<AnnotationObject, SessionError> {
        self.submit_point("add_point", kind, |size, space| {
            coords::to_image_space(client, rect, size, space)
        })
        .await
    }

    /// Add a prompt point already expressed in the session's coordinate space.
    pub async fn add_image_point(
        &self,
        point: ImagePoint,
        kind: PointKind,
    ) -> Result<AnnotationObject, SessionError> {
        if !point.x.is_finite() || !point.y.is_finite() {
            return Err(self.fail(SessionError::InvalidInput(format!(
                "point ({}, {}) is not finite",
                point.x, point.y
            ))));
        }
        self.submit_point("add_image_point", kind, |_, _| Ok(point))
            .await
    }

    async fn submit_point<F>(
        &self,
        operation: &'static str,
        kind: PointKind,
        locate: F,
    ) -> Result<AnnotationObject, SessionError>
    where
        F: FnOnce(ImageSize, CoordinateSpace) -> Result<ImagePoint, coords::MappingError>,
    {
        let space = self.options.coordinate_space;

        let prepared = {
            let mut state = self.lock();
            Self::require_active(&state, operation).and_then(|session_id| {
                let size = state
                    .image
                    .as_ref()
                    .map_or(ImageSize::new(0, 0), |i| i.size);
                let stored = locate(size, space)?;
                let native = coords::to_native_pixels(stored, size, space)?;
                let request = AddPointRequest {
                    session_id,
                    point: [native.x, native.y],
                    label: kind.label(),
                    clear_previous: false,
                };
                Ok((self.begin(&mut state, operation), stored, request))
            })
        };
        let (mut in_flight, stored, request) = match prepared {
            Ok(prepared) => prepared,
            // Mapping failures are a UI condition, not reported as errors
            Err(e @ SessionError::MappingUnavailable(_)) => return Err(e),
            Err(e) => return Err(self.fail(e)),
        };

        self.status("Segmenting...");
        let result = self.backend.add_point(&request).await;
        let mut state = in_flight.reacquire()?;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                drop(state);
                log::warn!("add_point failed: {}", e);
                return Err(self.fail(SessionError::NetworkFailure(e)));
            }
        };

        let point = Point::new(stored.x, stored.y, kind);
        let Some(object) = state.current_object_mut() else {
            return Err(SessionError::StateViolation {
                operation,
                phase: SessionPhase::SessionActive,
            });
        };
        object.points.push(point);
        object.mask = response.mask;
        object.bbox = response.bbox;
        if let Some(score) = response.score {
            object.set_confidence(score);
        }
        let updated = object.clone();
        drop(state);

        log::debug!(
            "Object {} now has {} points (backend reports {:?})",
            updated.id,
            updated.points.len(),
            response.total_points
        );
        self.emit(SessionEvent::PointAdded {
            object_id: updated.id,
            point,
            total_points: response.total_points,
        });
        Ok(updated)
    }

    /// Remove the current object's points, mask and box.
    pub async fn clear_current_object_points(&self) -> Result<(), SessionError> {
        const OP: &str = "clear_current_object_points";

        let prepared = {
            let mut state = self.lock();
            Self::require_active(&state, OP)
                .map(|session_id| (self.begin(&mut state, OP), session_id))
        };
        let (mut in_flight, session_id) = prepared.map_err(|e| self.fail(e))?;

        let result = self.backend.clear_points(&session_id).await;
        let mut state = in_flight.reacquire()?;
        if let Err(e) = result {
            drop(state);
            return Err(self.fail(SessionError::NetworkFailure(e)));
        }

        let cleared = state.current_object_mut().map(|object| {
            object.clear_prompts();
            object.confidence = None;
            object.id
        });
        drop(state);

        if let Some(object_id) = cleared {
            log::info!("Cleared points of object {}", object_id);
            self.emit(SessionEvent::PointsCleared { object_id });
        }
        Ok(())
    }

    /// Finish the current object and start a new, empty one.
    ///
    /// The backend keeps a single point history per session, so it is
    /// cleared first. If that fails nothing changes.
    pub async fn advance_to_next_object(&self) -> Result<ObjectId, SessionError> {
        const OP: &str = "advance_to_next_object";

        let prepared = {
            let mut state = self.lock();
            Self::require_active(&state, OP)
                .map(|session_id| (self.begin(&mut state, OP), session_id))
        };
        let (mut in_flight, session_id) = prepared.map_err(|e| self.fail(e))?;

        let result = self.backend.clear_points(&session_id).await;
        let mut state = in_flight.reacquire()?;
        if let Err(e) = result {
            drop(state);
            return Err(self.fail(SessionError::NetworkFailure(e)));
        }

        let object_id = state.allocate_object();
        state.current_object_id = Some(object_id);
        drop(state);

        log::info!("Started object {}", object_id);
        self.emit(SessionEvent::ObjectAdvanced { object_id });
        Ok(object_id)
    }

    /// Drop the session and all objects, keeping the image.
    ///
    /// Synchronous and local: the backend session is not closed and the
    /// image is not uploaded again until [`start_session`](Self::start_session).
    pub fn reset_all(&self) {
        let phase = {
            let mut state = self.lock();
            state.reset();
            state.phase
        };
        log::info!("Session reset ({})", phase);
        self.emit(SessionEvent::Reset);
    }

    /// Close the backend session, then [`reset_all`](Self::reset_all).
    ///
    /// Close failures are logged only. If the session was replaced while
    /// closing, the new one is left alone.
    pub async fn end_session(&self) {
        let (session_id, generation) = {
            let state = self.lock();
            (state.session_id.clone(), state.generation)
        };
        if let Some(id) = session_id {
            self.close_quietly(&id).await;
        }

        let reset = {
            let mut state = self.lock();
            let current = state.generation == generation;
            if current {
                state.reset();
            }
            current
        };
        if reset {
            self.emit(SessionEvent::Reset);
        } else {
            log::debug!("Session changed while closing; skipping reset");
        }
    }

    async fn close_quietly(&self, session_id: &str) {
        match self.backend.close_session(session_id).await {
            Ok(()) => log::info!("Closed backend session {}", session_id),
            Err(e) => log::warn!("Failed to close backend session {}: {}", session_id, e),
        }
    }

    /// Run text-prompted detection and add every result as a new object.
    pub async fn auto_annotate(
        &self,
        request: &AutoAnnotateRequest,
    ) -> Result<Vec<ObjectId>, SessionError> {
        const OP: &str = "auto_annotate";

        let prepared = {
            let mut state = self.lock();
            Self::require_active(&state, OP).and_then(|_| {
                let image = state.image.as_ref().map(|i| i.file.clone()).ok_or(
                    SessionError::StateViolation {
                        operation: OP,
                        phase: state.phase,
                    },
                )?;
                Ok((self.begin(&mut state, OP), image))
            })
        };
        let (mut in_flight, image) = prepared.map_err(|e| self.fail(e))?;

        self.status("Detecting objects...");
        let result = self.backend.auto_annotate(&image, request).await;
        let mut state = in_flight.reacquire()?;
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                drop(state);
                return Err(self.fail(SessionError::NetworkFailure(e)));
            }
        };

        let ids = state.merge_detections(&response);
        drop(state);
        self.report_merge(&response, &ids);
        Ok(ids)
    }

    /// Merge an already fetched detection response. The current object is kept.
    pub fn merge_detections(
        &self,
        response: &AutoAnnotateResponse,
    ) -> Result<Vec<ObjectId>, SessionError> {
        let ids = {
            let mut state = self.lock();
            if state.phase != SessionPhase::SessionActive {
                return Err(SessionError::StateViolation {
                    operation: "merge_detections",
                    phase: state.phase,
                });
            }
            state.merge_detections(response)
        };
        self.report_merge(response, &ids);
        Ok(ids)
    }

    fn report_merge(&self, response: &AutoAnnotateResponse, ids: &[ObjectId]) {
        log::info!(
            "Merged {} detections{}",
            ids.len(),
            response
                .processing_time
                .map(|t| format!(" (detector took {:.2}s)", t))
                .unwrap_or_default()
        );
        self.emit(SessionEvent::DetectionsMerged {
            object_ids: ids.to_vec(),
        });
    }

    /// Ask the backend whether it is up.
    pub async fn check_health(&self) -> Result<HealthResponse, SessionError> {
        self.backend
            .health()
            .await
            .map_err(SessionError::NetworkFailure)
    }
}
