//! Artifact format implementations.

mod csv;
mod json;

#[cfg(test)]
mod tests;

pub use csv::CsvArtifact;
pub use json::JsonArtifact;
