//! Session state and the pure transitions on it.

use std::fmt;
use std::sync::Arc;

use crate::backend::AutoAnnotateResponse;
use crate::codec;
use crate::coords::CoordinateSpace;
use crate::model::{AnnotationObject, ImageFile, ImageSize, ObjectId};

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    /// Nothing loaded yet.
    #[default]
    NoImage,
    /// Image decoded locally, no backend session.
    ImageLoaded,
    /// Upload and session creation in flight.
    SessionStarting,
    /// Backend session open; points can be added.
    SessionActive,
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::NoImage => "no image loaded",
            SessionPhase::ImageLoaded => "image loaded",
            SessionPhase::SessionStarting => "session starting",
            SessionPhase::SessionActive => "session active",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The loaded source image and its native size.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub file: Arc<ImageFile>,
    pub size: ImageSize,
}

/// Immutable copy of the session for rendering and export.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub busy: bool,
    pub session_id: Option<String>,
    pub image: Option<LoadedImage>,
    pub objects: Vec<AnnotationObject>,
    pub current_object_id: Option<ObjectId>,
    pub coordinate_space: CoordinateSpace,
}

impl SessionSnapshot {
    pub fn image_size(&self) -> Option<ImageSize> {
        self.image.as_ref().map(|i| i.size)
    }

    pub fn current_object(&self) -> Option<&AnnotationObject> {
        let id = self.current_object_id?;
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn total_points(&self) -> usize {
        self.objects.iter().map(|o| o.points.len()).sum()
    }
}

/// Mutable state behind the session lock.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub phase: SessionPhase,
    pub busy: bool,
    /// Bumped on load and reset so late responses can be recognized.
    pub generation: u64,
    pub image: Option<LoadedImage>,
    pub session_id: Option<String>,
    pub objects: Vec<AnnotationObject>,
    pub current_object_id: Option<ObjectId>,
    /// Highest id handed out in this session, even if the object is gone.
    pub highest_allocated: ObjectId,
}

impl SessionState {
    /// Forget the backend session and every object. The image stays.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.busy = false;
        self.session_id = None;
        self.objects.clear();
        self.current_object_id = None;
        self.highest_allocated = 0;
        self.phase = if self.image.is_some() {
            SessionPhase::ImageLoaded
        } else {
            SessionPhase::NoImage
        };
    }

    /// Replace the image and reset everything else.
    pub fn load(&mut self, image: LoadedImage) {
        self.image = Some(image);
        self.reset();
    }

    /// Open the session with object 1 current.
    pub fn activate(&mut self, session_id: String) {
        self.session_id = Some(session_id);
        self.objects.clear();
        self.highest_allocated = 0;
        let id = self.allocate_object();
        self.current_object_id = Some(id);
        self.phase = SessionPhase::SessionActive;
    }

    /// Create an empty object with a fresh id and return the id.
    pub fn allocate_object(&mut self) -> ObjectId {
        let max_existing = self.objects.iter().map(|o| o.id).max().unwrap_or(0);
        let id = max_existing.max(self.highest_allocated) + 1;
        self.highest_allocated = id;
        self.objects.push(AnnotationObject::new(id));
        id
    }

    pub fn current_object_mut(&mut self) -> Option<&mut AnnotationObject> {
        let id = self.current_object_id?;
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Append every detection as a new object. The current object is kept.
    pub fn merge_detections(&mut self, response: &AutoAnnotateResponse) -> Vec<ObjectId> {
        let image_size = self.image.as_ref().map(|i| i.size);
        let mut ids = Vec::with_capacity(response.objects.len());

        for detection in &response.objects {
            let id = self.allocate_object();
            let Some(object) = self.objects.last_mut() else {
                continue;
            };
            object.label = detection.label.clone();
            object.bbox = detection.bbox;
            object.mask = match (&detection.mask, &detection.bbox, image_size) {
                (Some(mask), _, _) if mask.has_payload() => Some(mask.clone()),
                (_, Some(bbox), Some(size)) => Some(codec::synthesize_from_bbox(bbox, size)),
                _ => None,
            };
            if let Some(score) = detection.score() {
                object.set_confidence(score);
            }
            ids.push(id);
        }
        ids
    }

    pub fn snapshot(&self, coordinate_space: CoordinateSpace) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            busy: self.busy,
            session_id: self.session_id.clone(),
            image: self.image.clone(),
            objects: self.objects.clone(),
            current_object_id: self.current_object_id,
            coordinate_space,
        }
    }
}
