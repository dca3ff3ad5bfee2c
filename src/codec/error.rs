//! Error types for mask decoding.

use thiserror::Error;

/// Why a mask payload could not be decoded by any strategy.
///
/// These never reach the user: [`decode`](super::decode) logs them and falls
/// back to an empty mask.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// String is neither Base64 nor a list of run lengths
    #[error("'{token}' is not a valid run length (payload is not Base64 either)")]
    InvalidRun {
        /// The offending token
        token: String,
    },

    /// Array entry cannot be used as a byte value
    #[error("array entry {index} ({value}) is not a finite number")]
    InvalidValue {
        /// Position in the array
        index: usize,
        /// The value found
        value: f64,
    },
}
