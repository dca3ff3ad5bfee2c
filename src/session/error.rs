//! Session operation errors.

use thiserror::Error;

use crate::backend::BackendError;
use crate::coords::MappingError;

use super::SessionPhase;

/// Why a session operation was refused or failed.
///
/// Every variant leaves the session exactly as it was before the call.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The picked file cannot be used as an image.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation is not allowed in the current phase.
    #[error("{operation} is not allowed while {phase}")]
    StateViolation {
        operation: &'static str,
        phase: SessionPhase,
    },

    /// Another network operation is still in flight.
    #[error("{0} rejected: another request is in progress")]
    Busy(&'static str),

    /// The display geometry does not allow mapping a click.
    #[error(transparent)]
    MappingUnavailable(#[from] MappingError),

    /// Upload or session creation failed.
    #[error("failed to start session: {0}")]
    SessionStartFailed(#[source] BackendError),

    /// A backend call failed after the session was established.
    #[error("request failed: {0}")]
    NetworkFailure(#[source] BackendError),

    /// The session was reset or replaced while the request was in flight.
    #[error("response discarded: session was reset while {0} was in flight")]
    Superseded(&'static str),
}
