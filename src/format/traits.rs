//! Trait definitions for artifact format implementations.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::constants::ARTIFACT_FILE_PREFIX;
use crate::format::artifact::ArtifactData;
use crate::format::error::ExportError;
use crate::session::SessionSnapshot;

/// Trait for downloadable artifact formats.
///
/// Each format (JSON, CSV) flattens every object of a session, together
/// with the source image, into a single file.
pub trait ArtifactFormat: Send + Sync {
    /// Unique identifier for this format (e.g., "json", "csv").
    fn id(&self) -> &'static str;

    /// Human-readable name for UI display.
    fn display_name(&self) -> &'static str;

    /// File extension without the dot.
    fn extension(&self) -> &'static str;

    /// Serialize already collected data.
    fn write_artifact(&self, data: &ArtifactData<'_>) -> Result<Vec<u8>, ExportError>;

    /// Serialize a snapshot into the artifact's bytes.
    fn export_to_bytes(
        &self,
        snapshot: &SessionSnapshot,
        options: &ExportOptions,
    ) -> Result<Vec<u8>, ExportError> {
        let data = ArtifactData::from_snapshot(snapshot, options)?;
        self.write_artifact(&data)
    }

    /// Write the artifact into `dir` under its generated file name.
    fn export(
        &self,
        snapshot: &SessionSnapshot,
        dir: &Path,
        options: &ExportOptions,
    ) -> Result<ExportResult, ExportError> {
        let data = ArtifactData::from_snapshot(snapshot, options)?;
        let bytes = self.write_artifact(&data)?;
        let path = dir.join(artifact_file_name(self.extension(), data.exported_at));
        std::fs::write(&path, &bytes)?;

        log::info!(
            "Exported {} objects as {} to {:?}",
            data.objects.len(),
            self.display_name(),
            path
        );
        Ok(ExportResult {
            path,
            objects_exported: data.objects.len(),
            bytes_written: bytes.len(),
        })
    }
}

/// `sam2_annotations_<epoch-millis>.<ext>`
pub fn artifact_file_name(extension: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}.{}",
        ARTIFACT_FILE_PREFIX,
        at.timestamp_millis(),
        extension
    )
}

/// Options for export operations.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Leave out objects with no points, mask or box.
    pub skip_empty_objects: bool,

    /// Timestamp to record; `None` uses the current time.
    pub exported_at: Option<DateTime<Utc>>,
}

impl ExportOptions {
    /// Create new export options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave out empty objects.
    pub fn skip_empty_objects(mut self, skip: bool) -> Self {
        self.skip_empty_objects = skip;
        self
    }

    /// Record a fixed export time.
    pub fn exported_at(mut self, at: DateTime<Utc>) -> Self {
        self.exported_at = Some(at);
        self
    }
}

/// Result of writing an artifact to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportResult {
    /// File that was created.
    pub path: PathBuf,

    /// Number of objects in the artifact.
    pub objects_exported: usize,

    pub bytes_written: usize,
}
