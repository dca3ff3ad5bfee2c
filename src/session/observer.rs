//! Notifications about session progress.

use crate::model::{ImageSize, ObjectId, Point};

/// Something a UI may want to show.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Short progress text, e.g. "Uploading image..."
    Status(String),
    ImageLoaded {
        file_name: String,
        size: ImageSize,
    },
    SessionStarted {
        session_id: String,
    },
    PointAdded {
        object_id: ObjectId,
        point: Point,
        /// Point count reported by the backend, if any
        total_points: Option<u32>,
    },
    PointsCleared {
        object_id: ObjectId,
    },
    ObjectAdvanced {
        object_id: ObjectId,
    },
    DetectionsMerged {
        object_ids: Vec<ObjectId>,
    },
    Reset,
    /// An operation failed; the text is user-facing.
    Error(String),
}

/// Receives [`SessionEvent`]s. Called outside the session lock.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: &SessionEvent);
}

/// Forwards every event to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Error(message) => log::warn!("Session error: {}", message),
            SessionEvent::Status(text) => log::info!("{}", text),
            other => log::debug!("Session event: {:?}", other),
        }
    }
}
