//! Error types for artifact export.

use thiserror::Error;

/// Errors that can occur while exporting annotations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// No backend session, so there is nothing to export
    #[error("nothing to export: no active session")]
    NoSession,

    /// The snapshot carries no source image
    #[error("nothing to export: no image loaded")]
    NoImage,

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while writing the artifact
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No format registered under this id
    #[error("unknown export format '{id}'")]
    UnknownFormat {
        /// The requested id
        id: String,
    },
}
