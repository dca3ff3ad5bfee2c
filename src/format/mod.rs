//! Artifact export system.
//!
//! A session can be downloaded as a single self-contained file holding the
//! source image and every annotation object. Formats implement
//! [`ArtifactFormat`] and are looked up through a [`FormatRegistry`].
//!
//! ## Supported Formats
//!
//! - **JSON**: pretty-printed, image as a data URI, full object data
//! - **CSV**: one row with the Base64 image and a compact JSON summary
//!
//! ## Usage
//!
//! ```rust,ignore
//! use labelseg::format::{ExportOptions, FormatRegistry};
//!
//! let registry = FormatRegistry::new();
//! let format = registry.require("json")?;
//! let result = format.export(&session.snapshot(), dir, &ExportOptions::default())?;
//! ```

mod artifact;
mod error;
pub mod formats;
mod registry;
mod traits;

pub use artifact::{ArtifactData, ExportedObject};
pub use error::ExportError;
pub use registry::FormatRegistry;
pub use traits::{ArtifactFormat, ExportOptions, ExportResult, artifact_file_name};
