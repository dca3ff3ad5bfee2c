//! Format registry for discovering and accessing artifact formats.

use std::collections::HashMap;

use crate::format::error::ExportError;
use crate::format::formats::{CsvArtifact, JsonArtifact};
use crate::format::traits::ArtifactFormat;

/// Registry of available artifact formats.
///
/// All built-in formats are registered automatically on creation.
pub struct FormatRegistry {
    formats: HashMap<&'static str, Box<dyn ArtifactFormat>>,
}

impl FormatRegistry {
    /// Create a new registry with all built-in formats registered.
    pub fn new() -> Self {
        let mut registry = Self {
            formats: HashMap::new(),
        };

        registry.register(Box::new(JsonArtifact));
        registry.register(Box::new(CsvArtifact));

        registry
    }

    /// Register a format implementation.
    pub fn register(&mut self, format: Box<dyn ArtifactFormat>) {
        self.formats.insert(format.id(), format);
    }

    /// Get a format by its ID.
    pub fn get(&self, id: &str) -> Option<&dyn ArtifactFormat> {
        self.formats.get(id).map(|f| f.as_ref())
    }

    /// Like [`get`](Self::get), but an unknown id is an error.
    pub fn require(&self, id: &str) -> Result<&dyn ArtifactFormat, ExportError> {
        self.get(id).ok_or_else(|| ExportError::UnknownFormat { id: id.to_string() })
    }

    /// Find a format by file extension.
    pub fn by_extension(&self, ext: &str) -> Option<&dyn ArtifactFormat> {
        let ext = ext.trim_start_matches('.');
        self.formats
            .values()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
            .map(|f| f.as_ref())
    }

    /// Get all format IDs, sorted.
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.formats.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}
