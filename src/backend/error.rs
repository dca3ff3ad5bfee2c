//! Backend transport errors.

use thiserror::Error;

/// Errors from talking to the segmentation or detection service.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The HTTP request itself failed (network, DNS, timeout, bad JSON body).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("backend API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response that reports failure in its body.
    #[error("backend rejected the request: {0}")]
    Rejected(String),

    /// Failure from a non-HTTP transport.
    #[error("transport error: {0}")]
    Transport(String),
}
